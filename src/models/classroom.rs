// src/models/classroom.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'classrooms' table. Owned by exactly one teacher.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Classroom {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub teacher_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewClassroom {
    pub name: String,
    pub description: Option<String>,
    pub teacher_id: i64,
}

/// Represents the 'lessons' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Lesson {
    pub id: i64,
    pub classroom_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewLesson {
    pub classroom_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClassroomRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name length must be between 1 and 100 chars"
    ))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EnrollmentRequest {
    pub student_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLessonRequest {
    pub classroom_id: i64,
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title length must be between 1 and 200 chars"
    ))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub scheduled_at: Option<chrono::DateTime<chrono::Utc>>,
}
