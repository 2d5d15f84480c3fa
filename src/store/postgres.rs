// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::PgPool;

use super::{Repository, StoreError};
use crate::models::{
    assignment::{Assignment, NewAssignment},
    classroom::{Classroom, Lesson, NewClassroom, NewLesson},
    submission::{NewSubmission, Submission},
    user::{NewUser, User},
};

const USER_COLUMNS: &str = "id, email, full_name, hashed_password, role, created_at";
const CLASSROOM_COLUMNS: &str = "id, name, description, teacher_id";
const LESSON_COLUMNS: &str = "id, classroom_id, title, description, scheduled_at";
const ASSIGNMENT_COLUMNS: &str =
    "id, lesson_id, title, description, due_at, max_score, is_published, allow_resubmission";
const SUBMISSION_COLUMNS: &str = "id, assignment_id, student_id, state, submitted_at, content, \
     file_key, resubmission_count, score, feedback, graded_at, graded_by, version";

/// Maps a unique-constraint violation to `StoreError::Duplicate`.
fn unique_violation(constraint: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return StoreError::Duplicate(constraint);
            }
        }
        StoreError::Database(e)
    }
}

/// PostgreSQL-backed repository.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (email, full_name, hashed_password, role) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.full_name)
            .bind(&user.hashed_password)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await
            .map_err(unique_violation("users.email"))
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_classroom(&self, classroom: NewClassroom) -> Result<Classroom, StoreError> {
        let sql = format!(
            "INSERT INTO classrooms (name, description, teacher_id) \
             VALUES ($1, $2, $3) RETURNING {CLASSROOM_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Classroom>(&sql)
            .bind(&classroom.name)
            .bind(&classroom.description)
            .bind(classroom.teacher_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_classroom(&self, id: i64) -> Result<Option<Classroom>, StoreError> {
        let sql = format!("SELECT {CLASSROOM_COLUMNS} FROM classrooms WHERE id = $1");
        Ok(sqlx::query_as::<_, Classroom>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_classrooms_for_teacher(
        &self,
        teacher_id: i64,
    ) -> Result<Vec<Classroom>, StoreError> {
        let sql =
            format!("SELECT {CLASSROOM_COLUMNS} FROM classrooms WHERE teacher_id = $1 ORDER BY id");
        Ok(sqlx::query_as::<_, Classroom>(&sql)
            .bind(teacher_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn enroll(&self, classroom_id: i64, student_id: i64) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO classroom_enrollments (classroom_id, student_id) \
             VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(classroom_id)
        .bind(student_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn is_enrolled(&self, classroom_id: i64, student_id: i64) -> Result<bool, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT student_id FROM classroom_enrollments \
             WHERE classroom_id = $1 AND student_id = $2",
        )
        .bind(classroom_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn list_enrolled(&self, classroom_id: i64) -> Result<Vec<i64>, StoreError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT student_id FROM classroom_enrollments \
             WHERE classroom_id = $1 ORDER BY student_id",
        )
        .bind(classroom_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn create_lesson(&self, lesson: NewLesson) -> Result<Lesson, StoreError> {
        let sql = format!(
            "INSERT INTO lessons (classroom_id, title, description, scheduled_at) \
             VALUES ($1, $2, $3, $4) RETURNING {LESSON_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Lesson>(&sql)
            .bind(lesson.classroom_id)
            .bind(&lesson.title)
            .bind(&lesson.description)
            .bind(lesson.scheduled_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_lesson(&self, id: i64) -> Result<Option<Lesson>, StoreError> {
        let sql = format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = $1");
        Ok(sqlx::query_as::<_, Lesson>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_lessons(&self, classroom_id: i64) -> Result<Vec<Lesson>, StoreError> {
        let sql =
            format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE classroom_id = $1 ORDER BY id");
        Ok(sqlx::query_as::<_, Lesson>(&sql)
            .bind(classroom_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_assignment(
        &self,
        assignment: NewAssignment,
    ) -> Result<Assignment, StoreError> {
        let sql = format!(
            "INSERT INTO assignments \
             (lesson_id, title, description, due_at, max_score, is_published, allow_resubmission) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {ASSIGNMENT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Assignment>(&sql)
            .bind(assignment.lesson_id)
            .bind(&assignment.title)
            .bind(&assignment.description)
            .bind(assignment.due_at)
            .bind(assignment.max_score)
            .bind(assignment.is_published)
            .bind(assignment.allow_resubmission)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_assignment(&self, id: i64) -> Result<Option<Assignment>, StoreError> {
        let sql = format!("SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = $1");
        Ok(sqlx::query_as::<_, Assignment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_assignments(&self, lesson_id: i64) -> Result<Vec<Assignment>, StoreError> {
        let sql =
            format!("SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE lesson_id = $1 ORDER BY id");
        Ok(sqlx::query_as::<_, Assignment>(&sql)
            .bind(lesson_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_submission(&self, id: i64) -> Result<Option<Submission>, StoreError> {
        let sql = format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = $1");
        Ok(sqlx::query_as::<_, Submission>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_submissions_for_student(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Vec<Submission>, StoreError> {
        let sql = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions \
             WHERE assignment_id = $1 AND student_id = $2"
        );
        Ok(sqlx::query_as::<_, Submission>(&sql)
            .bind(assignment_id)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_submissions(&self, assignment_id: i64) -> Result<Vec<Submission>, StoreError> {
        let sql = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE assignment_id = $1 ORDER BY id"
        );
        Ok(sqlx::query_as::<_, Submission>(&sql)
            .bind(assignment_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_submission(
        &self,
        submission: NewSubmission,
    ) -> Result<Submission, StoreError> {
        let sql = format!(
            "INSERT INTO submissions \
             (assignment_id, student_id, state, submitted_at, content, file_key) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {SUBMISSION_COLUMNS}"
        );
        sqlx::query_as::<_, Submission>(&sql)
            .bind(submission.assignment_id)
            .bind(submission.student_id)
            .bind(submission.state)
            .bind(submission.submitted_at)
            .bind(&submission.content)
            .bind(&submission.file_key)
            .fetch_one(&self.pool)
            .await
            .map_err(unique_violation("uq_submission_assignment_student"))
    }

    async fn update_submission(&self, submission: &Submission) -> Result<Submission, StoreError> {
        let sql = format!(
            "UPDATE submissions SET \
                state = $3, submitted_at = $4, content = $5, file_key = $6, \
                resubmission_count = $7, score = $8, feedback = $9, graded_at = $10, \
                graded_by = $11, version = version + 1 \
             WHERE id = $1 AND version = $2 \
             RETURNING {SUBMISSION_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Submission>(&sql)
            .bind(submission.id)
            .bind(submission.version)
            .bind(submission.state)
            .bind(submission.submitted_at)
            .bind(&submission.content)
            .bind(&submission.file_key)
            .bind(submission.resubmission_count)
            .bind(submission.score)
            .bind(&submission.feedback)
            .bind(submission.graded_at)
            .bind(submission.graded_by)
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(row) => Ok(row),
            None => {
                // Zero rows: either the id is gone or another writer bumped the version.
                let exists = self.find_submission(submission.id).await?.is_some();
                if exists {
                    Err(StoreError::VersionConflict(submission.id))
                } else {
                    Err(StoreError::Missing(submission.id))
                }
            }
        }
    }
}
