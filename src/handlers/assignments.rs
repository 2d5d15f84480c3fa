// src/handlers/assignments.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use super::{assignment_scope, validation_error};
use crate::{
    error::AppError,
    lifecycle,
    models::{
        assignment::{Assignment, CreateAssignmentRequest, NewAssignment},
        classroom::Lesson,
    },
    store::DynRepository,
    utils::jwt::Claims,
};

/// Ensures the lesson belongs to a classroom owned by the teacher.
async fn owned_lesson(
    repo: &DynRepository,
    lesson_id: i64,
    teacher_id: i64,
) -> Result<Lesson, AppError> {
    let lesson = repo
        .find_lesson(lesson_id)
        .await?
        .ok_or(AppError::NotFound("Lesson not found".to_string()))?;

    let classroom = repo.find_classroom(lesson.classroom_id).await?;
    match classroom {
        Some(c) if c.teacher_id == teacher_id => Ok(lesson),
        _ => Err(AppError::Forbidden(
            "Not authorized to manage assignments for this lesson".to_string(),
        )),
    }
}

/// Loads an assignment the teacher is allowed to manage.
async fn owned_assignment(
    repo: &DynRepository,
    assignment_id: i64,
    teacher_id: i64,
) -> Result<Assignment, AppError> {
    let (assignment, classroom) = assignment_scope(repo, assignment_id).await?;
    if classroom.teacher_id != teacher_id {
        return Err(AppError::Forbidden(
            "Not authorized to manage assignments for this lesson".to_string(),
        ));
    }
    Ok(assignment)
}

/// Creates an assignment under a lesson owned by the current teacher.
pub async fn create_assignment(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(validation_error)?;
    owned_lesson(&repo, payload.lesson_id, claims.user_id()?).await?;

    let assignment = repo.create_assignment(NewAssignment::from(payload)).await?;
    tracing::info!(
        assignment_id = assignment.id,
        lesson_id = assignment.lesson_id,
        published = assignment.is_published,
        "Assignment created"
    );

    Ok((StatusCode::CREATED, Json(assignment)))
}

pub async fn list_assignments_for_lesson(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Path(lesson_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let lesson = owned_lesson(&repo, lesson_id, claims.user_id()?).await?;
    let assignments = repo.list_assignments(lesson.id).await?;
    Ok(Json(assignments))
}

pub async fn get_assignment(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let assignment = owned_assignment(&repo, id, claims.user_id()?).await?;
    Ok(Json(assignment))
}

/// Per-student status of every enrolled student, including derived
/// PENDING/MISSING entries for students without a submission.
pub async fn get_roster(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let (assignment, classroom) = assignment_scope(&repo, id).await?;
    if classroom.teacher_id != claims.user_id()? {
        return Err(AppError::Forbidden(
            "Not authorized to view submissions for this assignment".to_string(),
        ));
    }

    let enrolled = repo.list_enrolled(classroom.id).await?;
    let submissions = repo.list_submissions(assignment.id).await?;
    let entries = lifecycle::roster(&assignment, &enrolled, &submissions, Utc::now());

    Ok(Json(entries))
}

/// Enrolled students with no submission once the due date has passed.
pub async fn get_missing(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let (assignment, classroom) = assignment_scope(&repo, id).await?;
    if classroom.teacher_id != claims.user_id()? {
        return Err(AppError::Forbidden(
            "Not authorized to view submissions for this assignment".to_string(),
        ));
    }

    let enrolled = repo.list_enrolled(classroom.id).await?;
    let submissions = repo.list_submissions(assignment.id).await?;
    let missing = lifecycle::missing_students(&assignment, &enrolled, &submissions, Utc::now());

    Ok(Json(json!({
        "assignment_id": assignment.id,
        "due_at": assignment.due_at,
        "missing_student_ids": missing,
    })))
}
