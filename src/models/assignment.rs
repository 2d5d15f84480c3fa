// src/models/assignment.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

pub const DEFAULT_MAX_SCORE: f64 = 100.0;

/// Represents the 'assignments' table.
/// Read-only from the point of view of the submission lifecycle.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub lesson_id: i64,
    pub title: String,
    pub description: Option<String>,

    /// Deadline in UTC. An assignment without one is never late and never missing.
    pub due_at: Option<chrono::DateTime<chrono::Utc>>,

    /// Always > 0 (checked on creation and by a table constraint).
    pub max_score: f64,

    pub is_published: bool,

    /// Whether a student may submit again after the first submission.
    pub allow_resubmission: bool,
}

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub lesson_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_at: Option<chrono::DateTime<chrono::Utc>>,
    pub max_score: f64,
    pub is_published: bool,
    pub allow_resubmission: bool,
}

/// DTO for creating an assignment under a lesson.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAssignmentRequest {
    pub lesson_id: i64,

    #[validate(length(
        min = 1,
        max = 200,
        message = "Title length must be between 1 and 200 chars"
    ))]
    pub title: String,

    #[validate(length(max = 10000))]
    pub description: Option<String>,

    pub due_at: Option<chrono::DateTime<chrono::Utc>>,

    #[serde(default = "default_max_score")]
    #[validate(range(exclusive_min = 0.0, message = "max_score must be positive"))]
    pub max_score: f64,

    #[serde(default = "default_published")]
    pub is_published: bool,

    #[serde(default)]
    pub allow_resubmission: bool,
}

fn default_max_score() -> f64 {
    DEFAULT_MAX_SCORE
}

fn default_published() -> bool {
    true
}

impl From<CreateAssignmentRequest> for NewAssignment {
    fn from(req: CreateAssignmentRequest) -> Self {
        Self {
            lesson_id: req.lesson_id,
            title: req.title,
            description: req.description,
            due_at: req.due_at,
            max_score: req.max_score,
            is_published: req.is_published,
            allow_resubmission: req.allow_resubmission,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_defaults() {
        let req: CreateAssignmentRequest =
            serde_json::from_value(serde_json::json!({ "lesson_id": 1, "title": "Essay" }))
                .unwrap();

        assert_eq!(req.max_score, DEFAULT_MAX_SCORE);
        assert!(req.is_published);
        assert!(!req.allow_resubmission);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_request_rejects_non_positive_max_score() {
        let req: CreateAssignmentRequest = serde_json::from_value(serde_json::json!({
            "lesson_id": 1,
            "title": "Essay",
            "max_score": 0.0
        }))
        .unwrap();

        assert!(req.validate().is_err());
    }
}
