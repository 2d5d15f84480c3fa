// src/models/submission.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Stored lifecycle state. "Not submitted" and "missing" have no row and are never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "submission_state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionState {
    SubmittedOnTime,
    SubmittedLate,
    Graded,
}

/// Represents the 'submissions' table.
///
/// The grade slot is flattened into nullable columns: `score`, `graded_at`
/// and `graded_by` are either all set (state `Graded`) or all null.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,
    pub state: SubmissionState,
    pub submitted_at: DateTime<Utc>,

    /// Free-text answer.
    pub content: Option<String>,

    /// Opaque key returned by the blob store.
    pub file_key: Option<String>,

    pub resubmission_count: i32,

    pub score: Option<f64>,
    pub feedback: Option<String>,
    pub graded_at: Option<DateTime<Utc>>,
    pub graded_by: Option<i64>,

    /// Optimistic concurrency token, bumped on every update.
    pub version: i64,
}

impl Submission {
    /// Returns the grade slot if this submission has been graded.
    pub fn grade(&self) -> Option<Grade> {
        match (self.score, self.graded_at, self.graded_by) {
            (Some(score), Some(graded_at), Some(graded_by)) => Some(Grade {
                score,
                feedback: self.feedback.clone(),
                graded_at,
                graded_by,
            }),
            _ => None,
        }
    }
}

/// A first submission, not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubmission {
    pub assignment_id: i64,
    pub student_id: i64,
    pub state: SubmissionState,
    pub submitted_at: DateTime<Utc>,
    pub content: Option<String>,
    pub file_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grade {
    pub score: f64,
    pub feedback: Option<String>,
    pub graded_at: DateTime<Utc>,
    pub graded_by: i64,
}

/// DTO for grading. `score` is mandatory on POST and optional on PATCH.
#[derive(Debug, Deserialize, Validate)]
pub struct GradeRequest {
    pub score: Option<f64>,
    #[validate(length(max = 10000))]
    pub feedback: Option<String>,
}
