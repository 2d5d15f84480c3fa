// src/lifecycle/error.rs

use thiserror::Error;

/// Rejections returned by the lifecycle engine.
///
/// All variants are recoverable: the engine never mutates anything when it
/// returns one of them, and the caller decides how to surface it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LifecycleError {
    #[error("Assignment {0} is not published")]
    NotPublished(i64),

    #[error("Resubmission is not allowed for assignment {0}")]
    ResubmissionNotAllowed(i64),

    #[error("Submission must contain text content or a file")]
    EmptySubmission,

    #[error("Score {score} is outside the allowed range 0..={max}")]
    ScoreOutOfRange { score: f64, max: f64 },

    #[error("Submission not found")]
    SubmissionNotFound,

    #[error("A submission already exists for assignment {assignment_id} and student {student_id}")]
    DuplicateSubmission { assignment_id: i64, student_id: i64 },

    #[error("{0}")]
    NotAuthorized(&'static str),
}
