// src/lifecycle/mod.rs

//! Submission lifecycle engine.
//!
//! Owns every state transition of a submission and its grade slot. The
//! functions here are pure: they take the records loaded by the caller plus
//! `now`, and return either the record to persist or a [`LifecycleError`].
//! Nothing is mutated on failure.

pub mod error;
pub mod policy;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use error::LifecycleError;
pub use policy::{Timeliness, compute_timeliness};

use crate::models::{
    assignment::Assignment,
    submission::{NewSubmission, Submission, SubmissionState},
    user::Role,
};

/// Who is asking, plus the authorization facts resolved by the caller.
/// The engine trusts these facts and only branches on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
    pub role: Role,
    /// Student is enrolled in the assignment's classroom.
    pub enrolled: bool,
    /// Teacher owns the assignment's classroom.
    pub owns_classroom: bool,
}

impl Caller {
    pub fn student(user_id: i64, enrolled: bool) -> Self {
        Self {
            user_id,
            role: Role::Student,
            enrolled,
            owns_classroom: false,
        }
    }

    pub fn teacher(user_id: i64, owns_classroom: bool) -> Self {
        Self {
            user_id,
            role: Role::Teacher,
            enrolled: false,
            owns_classroom,
        }
    }
}

/// Content presented with a submit intent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionPayload {
    pub content: Option<String>,
    pub file_key: Option<String>,
}

/// Result of a successful submit.
#[derive(Debug, Clone, PartialEq)]
pub enum Submitted {
    /// First submission for the (assignment, student) pair; must be inserted.
    Created(NewSubmission),
    /// Replacement of an existing record; must be saved with its read version.
    Resubmitted(Submission),
}

/// Applies a submit intent.
///
/// `existing` is the record already stored for (assignment, caller), if any.
pub fn submit(
    caller: &Caller,
    assignment: &Assignment,
    existing: Option<&Submission>,
    payload: SubmissionPayload,
    now: DateTime<Utc>,
) -> Result<Submitted, LifecycleError> {
    match caller.role {
        Role::Student if caller.enrolled => {}
        Role::Student => {
            return Err(LifecycleError::NotAuthorized(
                "Student is not enrolled in this classroom",
            ));
        }
        Role::Teacher => {
            return Err(LifecycleError::NotAuthorized(
                "Only students can create submissions",
            ));
        }
    }

    if let Some(record) = existing {
        if record.assignment_id != assignment.id || record.student_id != caller.user_id {
            return Err(LifecycleError::NotAuthorized(
                "Submission belongs to another assignment or student",
            ));
        }
    }

    if !assignment.is_published {
        return Err(LifecycleError::NotPublished(assignment.id));
    }

    policy::check_resubmission(assignment, existing.is_some())?;

    let content = policy::normalize_text(payload.content);
    let file_key = policy::normalize_text(payload.file_key);
    if content.is_none() && file_key.is_none() {
        return Err(LifecycleError::EmptySubmission);
    }

    let state = compute_timeliness(assignment, now).submitted_state();

    let outcome = match existing {
        None => Submitted::Created(NewSubmission {
            assignment_id: assignment.id,
            student_id: caller.user_id,
            state,
            submitted_at: now,
            content,
            file_key,
        }),
        Some(record) => {
            let mut next = record.clone();
            next.state = state;
            next.submitted_at = now;
            next.content = content;
            next.file_key = file_key;
            next.resubmission_count += 1;
            // A new attempt invalidates the previous grade.
            next.score = None;
            next.feedback = None;
            next.graded_at = None;
            next.graded_by = None;
            Submitted::Resubmitted(next)
        }
    };

    Ok(outcome)
}

/// Only the teacher owning the assignment's classroom may grade it.
pub fn authorize_grader(caller: &Caller) -> Result<(), LifecycleError> {
    match caller.role {
        Role::Teacher if caller.owns_classroom => Ok(()),
        Role::Teacher => Err(LifecycleError::NotAuthorized(
            "Not authorized to grade this submission",
        )),
        Role::Student => Err(LifecycleError::NotAuthorized("Teacher access required")),
    }
}

/// Applies a grade (or re-grade) intent and returns the record to persist.
pub fn grade(
    caller: &Caller,
    assignment: &Assignment,
    submission: Option<&Submission>,
    score: f64,
    feedback: Option<String>,
    now: DateTime<Utc>,
) -> Result<Submission, LifecycleError> {
    let submission = submission
        .filter(|s| s.assignment_id == assignment.id)
        .ok_or(LifecycleError::SubmissionNotFound)?;

    authorize_grader(caller)?;
    policy::check_score(assignment, score)?;

    let mut next = submission.clone();
    next.state = SubmissionState::Graded;
    next.score = Some(score);
    next.feedback = feedback;
    next.graded_at = Some(now);
    next.graded_by = Some(caller.user_id);
    Ok(next)
}

/// Collapses the records found for one (assignment, student) pair.
/// More than one record means the uniqueness invariant was broken upstream.
pub fn single_record(
    assignment_id: i64,
    student_id: i64,
    mut records: Vec<Submission>,
) -> Result<Option<Submission>, LifecycleError> {
    if records.len() > 1 {
        return Err(LifecycleError::DuplicateSubmission {
            assignment_id,
            student_id,
        });
    }
    Ok(records.pop())
}

/// Derived per-student status for an assignment. Only the submitted and
/// graded variants correspond to stored rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudentStatus {
    /// No record and the due date has not passed.
    Pending,
    /// No record and the due date has passed.
    Missing,
    SubmittedOnTime,
    SubmittedLate,
    Graded,
}

impl From<SubmissionState> for StudentStatus {
    fn from(state: SubmissionState) -> Self {
        match state {
            SubmissionState::SubmittedOnTime => StudentStatus::SubmittedOnTime,
            SubmissionState::SubmittedLate => StudentStatus::SubmittedLate,
            SubmissionState::Graded => StudentStatus::Graded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    pub student_id: i64,
    pub status: StudentStatus,
    pub submission_id: Option<i64>,
    pub timeliness: Option<Timeliness>,
    pub score: Option<f64>,
}

/// Builds the status of every enrolled student for one assignment.
/// Submissions from students no longer enrolled are ignored.
pub fn roster(
    assignment: &Assignment,
    enrolled: &[i64],
    submissions: &[Submission],
    now: DateTime<Utc>,
) -> Vec<RosterEntry> {
    let by_student: HashMap<i64, &Submission> = submissions
        .iter()
        .filter(|s| s.assignment_id == assignment.id)
        .map(|s| (s.student_id, s))
        .collect();
    let past_due = policy::is_past_due(assignment, now);

    enrolled
        .iter()
        .map(|&student_id| match by_student.get(&student_id) {
            Some(s) => RosterEntry {
                student_id,
                status: s.state.into(),
                submission_id: Some(s.id),
                timeliness: Some(compute_timeliness(assignment, s.submitted_at)),
                score: s.grade().map(|g| g.score),
            },
            None => RosterEntry {
                student_id,
                status: if past_due {
                    StudentStatus::Missing
                } else {
                    StudentStatus::Pending
                },
                submission_id: None,
                timeliness: None,
                score: None,
            },
        })
        .collect()
}

/// Enrolled students with no submission once the due date has passed.
pub fn missing_students(
    assignment: &Assignment,
    enrolled: &[i64],
    submissions: &[Submission],
    now: DateTime<Utc>,
) -> Vec<i64> {
    roster(assignment, enrolled, submissions, now)
        .into_iter()
        .filter(|entry| entry.status == StudentStatus::Missing)
        .map(|entry| entry.student_id)
        .collect()
}
