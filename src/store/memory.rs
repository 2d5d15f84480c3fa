// src/store/memory.rs

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{Repository, StoreError};
use crate::models::{
    assignment::{Assignment, NewAssignment},
    classroom::{Classroom, Lesson, NewClassroom, NewLesson},
    submission::{NewSubmission, Submission},
    user::{NewUser, User},
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    classrooms: BTreeMap<i64, Classroom>,
    /// (classroom_id, student_id)
    enrollments: BTreeSet<(i64, i64)>,
    lessons: BTreeMap<i64, Lesson>,
    assignments: BTreeMap<i64, Assignment>,
    submissions: BTreeMap<i64, Submission>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local repository.
///
/// Every write happens under a single write lock, so the read-check-write in
/// `insert_submission` and `update_submission` is atomic.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("users.email"));
        }
        let id = tables.allocate_id();
        let row = User {
            id,
            email: user.email,
            full_name: user.full_name,
            hashed_password: user.hashed_password,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.insert(id, row.clone());
        Ok(row)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_classroom(&self, classroom: NewClassroom) -> Result<Classroom, StoreError> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        let row = Classroom {
            id,
            name: classroom.name,
            description: classroom.description,
            teacher_id: classroom.teacher_id,
        };
        tables.classrooms.insert(id, row.clone());
        Ok(row)
    }

    async fn find_classroom(&self, id: i64) -> Result<Option<Classroom>, StoreError> {
        Ok(self.tables.read().await.classrooms.get(&id).cloned())
    }

    async fn list_classrooms_for_teacher(
        &self,
        teacher_id: i64,
    ) -> Result<Vec<Classroom>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .classrooms
            .values()
            .filter(|c| c.teacher_id == teacher_id)
            .cloned()
            .collect())
    }

    async fn enroll(&self, classroom_id: i64, student_id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.classrooms.contains_key(&classroom_id) {
            return Err(StoreError::Missing(classroom_id));
        }
        if !tables.users.contains_key(&student_id) {
            return Err(StoreError::Missing(student_id));
        }
        tables.enrollments.insert((classroom_id, student_id));
        Ok(())
    }

    async fn is_enrolled(&self, classroom_id: i64, student_id: i64) -> Result<bool, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.enrollments.contains(&(classroom_id, student_id)))
    }

    async fn list_enrolled(&self, classroom_id: i64) -> Result<Vec<i64>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .enrollments
            .range((classroom_id, i64::MIN)..=(classroom_id, i64::MAX))
            .map(|&(_, student_id)| student_id)
            .collect())
    }

    async fn create_lesson(&self, lesson: NewLesson) -> Result<Lesson, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.classrooms.contains_key(&lesson.classroom_id) {
            return Err(StoreError::Missing(lesson.classroom_id));
        }
        let id = tables.allocate_id();
        let row = Lesson {
            id,
            classroom_id: lesson.classroom_id,
            title: lesson.title,
            description: lesson.description,
            scheduled_at: lesson.scheduled_at,
        };
        tables.lessons.insert(id, row.clone());
        Ok(row)
    }

    async fn find_lesson(&self, id: i64) -> Result<Option<Lesson>, StoreError> {
        Ok(self.tables.read().await.lessons.get(&id).cloned())
    }

    async fn list_lessons(&self, classroom_id: i64) -> Result<Vec<Lesson>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .lessons
            .values()
            .filter(|l| l.classroom_id == classroom_id)
            .cloned()
            .collect())
    }

    async fn create_assignment(
        &self,
        assignment: NewAssignment,
    ) -> Result<Assignment, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.lessons.contains_key(&assignment.lesson_id) {
            return Err(StoreError::Missing(assignment.lesson_id));
        }
        let id = tables.allocate_id();
        let row = Assignment {
            id,
            lesson_id: assignment.lesson_id,
            title: assignment.title,
            description: assignment.description,
            due_at: assignment.due_at,
            max_score: assignment.max_score,
            is_published: assignment.is_published,
            allow_resubmission: assignment.allow_resubmission,
        };
        tables.assignments.insert(id, row.clone());
        Ok(row)
    }

    async fn find_assignment(&self, id: i64) -> Result<Option<Assignment>, StoreError> {
        Ok(self.tables.read().await.assignments.get(&id).cloned())
    }

    async fn list_assignments(&self, lesson_id: i64) -> Result<Vec<Assignment>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .assignments
            .values()
            .filter(|a| a.lesson_id == lesson_id)
            .cloned()
            .collect())
    }

    async fn find_submission(&self, id: i64) -> Result<Option<Submission>, StoreError> {
        Ok(self.tables.read().await.submissions.get(&id).cloned())
    }

    async fn find_submissions_for_student(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Vec<Submission>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .submissions
            .values()
            .filter(|s| s.assignment_id == assignment_id && s.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn list_submissions(&self, assignment_id: i64) -> Result<Vec<Submission>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .submissions
            .values()
            .filter(|s| s.assignment_id == assignment_id)
            .cloned()
            .collect())
    }

    async fn insert_submission(
        &self,
        submission: NewSubmission,
    ) -> Result<Submission, StoreError> {
        let mut tables = self.tables.write().await;
        let taken = tables.submissions.values().any(|s| {
            s.assignment_id == submission.assignment_id && s.student_id == submission.student_id
        });
        if taken {
            return Err(StoreError::Duplicate("submissions.assignment_id_student_id"));
        }
        let id = tables.allocate_id();
        let row = Submission {
            id,
            assignment_id: submission.assignment_id,
            student_id: submission.student_id,
            state: submission.state,
            submitted_at: submission.submitted_at,
            content: submission.content,
            file_key: submission.file_key,
            resubmission_count: 0,
            score: None,
            feedback: None,
            graded_at: None,
            graded_by: None,
            version: 1,
        };
        tables.submissions.insert(id, row.clone());
        Ok(row)
    }

    async fn update_submission(&self, submission: &Submission) -> Result<Submission, StoreError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .submissions
            .get_mut(&submission.id)
            .ok_or(StoreError::Missing(submission.id))?;
        if stored.version != submission.version {
            return Err(StoreError::VersionConflict(submission.id));
        }
        let mut row = submission.clone();
        row.version += 1;
        *stored = row.clone();
        Ok(row)
    }
}
