// src/store/mod.rs

//! Persistence boundary.
//!
//! Handlers only talk to [`Repository`]. Two backends exist: PostgreSQL
//! (`postgres`) and a process-local store (`memory`) used when no database is
//! configured and by the integration tests. Both enforce the same
//! constraints: unique email, unique (assignment_id, student_id), and an
//! optimistic version check on submission updates.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    assignment::{Assignment, NewAssignment},
    classroom::{Classroom, Lesson, NewClassroom, NewLesson},
    submission::{NewSubmission, Submission},
    user::{NewUser, User},
};

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("duplicate record: {0}")]
    Duplicate(&'static str),

    /// The record changed between read and write.
    #[error("record {0} was modified concurrently")]
    VersionConflict(i64),

    #[error("record {0} not found")]
    Missing(i64),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type DynRepository = Arc<dyn Repository>;

#[async_trait]
pub trait Repository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn create_classroom(&self, classroom: NewClassroom) -> Result<Classroom, StoreError>;
    async fn find_classroom(&self, id: i64) -> Result<Option<Classroom>, StoreError>;
    async fn list_classrooms_for_teacher(&self, teacher_id: i64)
    -> Result<Vec<Classroom>, StoreError>;

    /// Idempotent: enrolling twice is not an error.
    async fn enroll(&self, classroom_id: i64, student_id: i64) -> Result<(), StoreError>;
    async fn is_enrolled(&self, classroom_id: i64, student_id: i64) -> Result<bool, StoreError>;
    /// Enrolled student ids in ascending order.
    async fn list_enrolled(&self, classroom_id: i64) -> Result<Vec<i64>, StoreError>;

    async fn create_lesson(&self, lesson: NewLesson) -> Result<Lesson, StoreError>;
    async fn find_lesson(&self, id: i64) -> Result<Option<Lesson>, StoreError>;
    async fn list_lessons(&self, classroom_id: i64) -> Result<Vec<Lesson>, StoreError>;

    async fn create_assignment(&self, assignment: NewAssignment)
    -> Result<Assignment, StoreError>;
    async fn find_assignment(&self, id: i64) -> Result<Option<Assignment>, StoreError>;
    async fn list_assignments(&self, lesson_id: i64) -> Result<Vec<Assignment>, StoreError>;

    async fn find_submission(&self, id: i64) -> Result<Option<Submission>, StoreError>;
    /// All rows for one (assignment, student) pair. More than one means the
    /// uniqueness invariant is broken.
    async fn find_submissions_for_student(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Vec<Submission>, StoreError>;
    async fn list_submissions(&self, assignment_id: i64) -> Result<Vec<Submission>, StoreError>;
    /// Fails with `Duplicate` if the pair already has a record.
    async fn insert_submission(&self, submission: NewSubmission)
    -> Result<Submission, StoreError>;
    /// Saves `submission` only if the stored version still equals
    /// `submission.version`; returns the row with the bumped version.
    async fn update_submission(&self, submission: &Submission) -> Result<Submission, StoreError>;
}
