// src/handlers/mod.rs

pub mod assignments;
pub mod auth;
pub mod classrooms;
pub mod grading;
pub mod health;
pub mod lessons;
pub mod submissions;
pub mod users;

use crate::{
    error::AppError,
    models::{assignment::Assignment, classroom::Classroom},
    store::DynRepository,
};

/// Loads an assignment together with the classroom that owns it
/// (assignment -> lesson -> classroom).
pub(crate) async fn assignment_scope(
    repo: &DynRepository,
    assignment_id: i64,
) -> Result<(Assignment, Classroom), AppError> {
    let assignment = repo
        .find_assignment(assignment_id)
        .await?
        .ok_or(AppError::NotFound("Assignment not found".to_string()))?;

    let lesson = repo
        .find_lesson(assignment.lesson_id)
        .await?
        .ok_or(AppError::NotFound("Lesson not found".to_string()))?;

    let classroom = repo
        .find_classroom(lesson.classroom_id)
        .await?
        .ok_or(AppError::NotFound("Classroom not found".to_string()))?;

    Ok((assignment, classroom))
}

/// Loads a classroom and checks the teacher owns it.
/// Foreign classrooms are reported as missing so their ids do not leak.
pub(crate) async fn owned_classroom(
    repo: &DynRepository,
    classroom_id: i64,
    teacher_id: i64,
) -> Result<Classroom, AppError> {
    repo.find_classroom(classroom_id)
        .await?
        .filter(|c| c.teacher_id == teacher_id)
        .ok_or(AppError::NotFound("Classroom not found".to_string()))
}

pub(crate) fn validation_error(errors: validator::ValidationErrors) -> AppError {
    AppError::BadRequest(errors.to_string())
}
