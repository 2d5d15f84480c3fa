// src/handlers/grading.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use validator::Validate;

use super::{assignment_scope, validation_error};
use crate::{
    error::AppError,
    lifecycle::{self, Caller, LifecycleError},
    models::{
        submission::{GradeRequest, Submission},
        user::Role,
    },
    store::DynRepository,
    utils::{html::clean_optional, jwt::Claims},
};

/// How unset fields in a grade request are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GradeMode {
    /// Full replacement: score required, feedback cleared when absent.
    Replace,
    /// Partial update: unset fields keep their currently graded values.
    Merge,
}

async fn apply_grade(
    repo: &DynRepository,
    claims: &Claims,
    submission_id: i64,
    payload: GradeRequest,
    mode: GradeMode,
) -> Result<Submission, AppError> {
    payload.validate().map_err(validation_error)?;

    let submission = repo
        .find_submission(submission_id)
        .await?
        .ok_or(LifecycleError::SubmissionNotFound)?;
    let (assignment, classroom) = assignment_scope(repo, submission.assignment_id).await?;

    let user_id = claims.user_id()?;
    let caller = match claims.role()? {
        Role::Teacher => Caller::teacher(user_id, classroom.teacher_id == user_id),
        Role::Student => Caller::student(user_id, false),
    };

    // Ownership is checked before the grade payload is interpreted.
    lifecycle::authorize_grader(&caller)
        .inspect_err(|e| tracing::warn!(submission_id, user_id, "Grade rejected: {}", e))?;

    let feedback = clean_optional(payload.feedback);
    let (score, feedback) = match mode {
        GradeMode::Replace => (payload.score, feedback),
        GradeMode::Merge => (
            payload.score.or(submission.score),
            feedback.or_else(|| submission.feedback.clone()),
        ),
    };
    let score = score.ok_or(AppError::BadRequest("score is required".to_string()))?;

    let graded = lifecycle::grade(&caller, &assignment, Some(&submission), score, feedback, Utc::now())
        .inspect_err(|e| {
            tracing::warn!(submission_id, teacher_id = user_id, "Grade rejected: {}", e)
        })?;

    let saved = repo.update_submission(&graded).await?;
    tracing::info!(
        submission_id = saved.id,
        teacher_id = user_id,
        score = ?saved.score,
        "Submission graded"
    );

    Ok(saved)
}

/// Grades a submission. Teachers may only grade submissions for assignments
/// in classrooms they own.
pub async fn grade_submission(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Path(submission_id): Path<i64>,
    Json(payload): Json<GradeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let saved = apply_grade(&repo, &claims, submission_id, payload, GradeMode::Replace).await?;
    Ok(Json(saved))
}

/// Updates an existing grade; omitted fields keep their graded values.
pub async fn update_grade(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Path(submission_id): Path<i64>,
    Json(payload): Json<GradeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let saved = apply_grade(&repo, &claims, submission_id, payload, GradeMode::Merge).await?;
    Ok(Json(saved))
}
