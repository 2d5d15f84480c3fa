// src/handlers/classrooms.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use super::{owned_classroom, validation_error};
use crate::{
    error::AppError,
    models::{
        classroom::{CreateClassroomRequest, EnrollmentRequest, NewClassroom},
        user::Role,
    },
    store::DynRepository,
    utils::jwt::Claims,
};

/// Creates a classroom owned by the current teacher.
pub async fn create_classroom(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateClassroomRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(validation_error)?;

    let classroom = repo
        .create_classroom(NewClassroom {
            name: payload.name,
            description: payload.description,
            teacher_id: claims.user_id()?,
        })
        .await?;

    tracing::info!(classroom_id = classroom.id, teacher_id = classroom.teacher_id, "Classroom created");

    Ok((StatusCode::CREATED, Json(classroom)))
}

/// Lists classrooms owned by the current teacher.
pub async fn list_classrooms(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let classrooms = repo.list_classrooms_for_teacher(claims.user_id()?).await?;
    Ok(Json(classrooms))
}

pub async fn get_classroom(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let classroom = owned_classroom(&repo, id, claims.user_id()?).await?;
    Ok(Json(classroom))
}

/// Enrolls a student into a classroom owned by the current teacher.
/// Enrolling an already-enrolled student succeeds silently.
pub async fn enroll_student(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<EnrollmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let classroom = owned_classroom(&repo, id, claims.user_id()?).await?;

    let student = repo.find_user(payload.student_id).await?;
    if !matches!(student, Some(ref u) if u.role == Role::Student) {
        return Err(AppError::BadRequest("Invalid student_id".to_string()));
    }

    repo.enroll(classroom.id, payload.student_id).await?;
    tracing::info!(classroom_id = classroom.id, student_id = payload.student_id, "Student enrolled");

    Ok(StatusCode::NO_CONTENT)
}
