// src/handlers/lessons.rs

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
    models::classroom::{CreateLessonRequest, NewLesson},
    store::DynRepository,
    utils::jwt::Claims,
};

/// Creates a lesson under a classroom owned by the current teacher.
pub async fn create_lesson(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateLessonRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(validation_error)?;
    let classroom = owned_classroom(&repo, payload.classroom_id, claims.user_id()?).await?;

    let lesson = repo
        .create_lesson(NewLesson {
            classroom_id: classroom.id,
            title: payload.title,
            description: payload.description,
            scheduled_at: payload.scheduled_at,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(lesson)))
}

pub async fn list_lessons_for_classroom(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Path(classroom_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let classroom = owned_classroom(&repo, classroom_id, claims.user_id()?).await?;
    let lessons = repo.list_lessons(classroom.id).await?;
    Ok(Json(lessons))
}
