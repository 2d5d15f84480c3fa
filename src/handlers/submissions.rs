// src/handlers/submissions.rs

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use super::assignment_scope;
use crate::{
    config::Config,
    error::AppError,
    lifecycle::{self, Caller, LifecycleError, SubmissionPayload, Submitted},
    models::user::Role,
    store::{DynRepository, StoreError},
    utils::{jwt::Claims, upload::BlobStore},
};

/// Fields accepted in the multipart submission form.
#[derive(Default)]
struct SubmissionForm {
    content: Option<String>,
    /// Original file name and bytes.
    file: Option<(Option<String>, Bytes)>,
}

async fn read_form(mut multipart: Multipart, max_upload_size: usize) -> Result<SubmissionForm, AppError> {
    let mut form = SubmissionForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("content") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                form.content = Some(text);
            }
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                if bytes.len() > max_upload_size {
                    return Err(AppError::BadRequest("Uploaded file is too large".to_string()));
                }
                if !bytes.is_empty() {
                    form.file = Some((file_name, bytes));
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Builds the caller context for an assignment's classroom.
async fn caller_for(
    repo: &DynRepository,
    claims: &Claims,
    classroom_id: i64,
    classroom_teacher_id: i64,
) -> Result<Caller, AppError> {
    let user_id = claims.user_id()?;
    Ok(match claims.role()? {
        Role::Student => Caller::student(user_id, repo.is_enrolled(classroom_id, user_id).await?),
        Role::Teacher => Caller::teacher(user_id, classroom_teacher_id == user_id),
    })
}

/// Submits (or resubmits) work for an assignment as a student.
///
/// Multipart form: optional `content` text and optional `file`; at least one
/// must be non-empty. Returns 201 for a first submission and 200 for a
/// resubmission.
pub async fn create_submission(
    State(repo): State<DynRepository>,
    State(blobs): State<BlobStore>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(assignment_id): Path<i64>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_form(multipart, config.max_upload_size).await?;

    let (assignment, classroom) = assignment_scope(&repo, assignment_id).await?;
    let caller = caller_for(&repo, &claims, classroom.id, classroom.teacher_id).await?;

    let existing = lifecycle::single_record(
        assignment.id,
        caller.user_id,
        repo.find_submissions_for_student(assignment.id, caller.user_id)
            .await?,
    )?;

    let now = Utc::now();
    let file_key = form
        .file
        .as_ref()
        .map(|(name, _)| blobs.reserve_key(caller.user_id, name.as_deref(), now));
    let payload = SubmissionPayload {
        content: form.content,
        file_key: file_key.clone(),
    };
    let previous_file = existing.as_ref().and_then(|s| s.file_key.clone());

    let outcome = lifecycle::submit(&caller, &assignment, existing.as_ref(), payload, now)
        .inspect_err(|e| {
            tracing::warn!(
                assignment_id = assignment.id,
                user_id = caller.user_id,
                "Submission rejected: {}",
                e
            )
        })?;

    // Only written once the engine has accepted the submission.
    if let (Some(key), Some((_, bytes))) = (&file_key, &form.file) {
        blobs.write(key, bytes).await?;
    }

    let stored = match outcome {
        Submitted::Created(new) => repo
            .insert_submission(new)
            .await
            .map(|saved| (saved, true))
            .map_err(|e| match e {
                StoreError::Duplicate(_) => AppError::from(LifecycleError::DuplicateSubmission {
                    assignment_id: assignment.id,
                    student_id: caller.user_id,
                }),
                other => AppError::from(other),
            }),
        Submitted::Resubmitted(next) => repo
            .update_submission(&next)
            .await
            .map(|saved| (saved, false))
            .map_err(AppError::from),
    };

    let (saved, created) = match stored {
        Ok(stored) => stored,
        Err(e) => {
            // Nothing references the new file.
            if let Some(key) = &file_key {
                blobs.remove(key).await;
            }
            return Err(e);
        }
    };

    if created {
        tracing::info!(
            submission_id = saved.id,
            assignment_id = saved.assignment_id,
            student_id = saved.student_id,
            state = ?saved.state,
            "Submission created"
        );
        return Ok((StatusCode::CREATED, Json(saved)));
    }

    if let Some(old) = previous_file.filter(|old| saved.file_key.as_ref() != Some(old)) {
        blobs.remove(&old).await;
    }
    tracing::info!(
        submission_id = saved.id,
        resubmission_count = saved.resubmission_count,
        state = ?saved.state,
        "Submission replaced"
    );
    Ok((StatusCode::OK, Json(saved)))
}

/// Lists submissions for an assignment.
///
/// Teachers see every submission of assignments they own; students only
/// see their own.
pub async fn list_submissions_for_assignment(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Path(assignment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let (assignment, classroom) = assignment_scope(&repo, assignment_id).await?;
    let user_id = claims.user_id()?;

    let submissions = match claims.role()? {
        Role::Teacher => {
            if classroom.teacher_id != user_id {
                return Err(AppError::Forbidden(
                    "Not authorized to view submissions for this assignment".to_string(),
                ));
            }
            repo.list_submissions(assignment.id).await?
        }
        Role::Student => {
            repo.find_submissions_for_student(assignment.id, user_id)
                .await?
        }
    };

    Ok(Json(submissions))
}

/// Retrieves a single submission for its student or the owning teacher.
pub async fn get_submission(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let submission = repo
        .find_submission(id)
        .await?
        .ok_or(LifecycleError::SubmissionNotFound)?;
    let (_, classroom) = assignment_scope(&repo, submission.assignment_id).await?;
    let user_id = claims.user_id()?;

    let allowed = match claims.role()? {
        Role::Student => submission.student_id == user_id,
        Role::Teacher => classroom.teacher_id == user_id,
    };
    if !allowed {
        return Err(AppError::Forbidden(
            "Not authorized to view this submission".to_string(),
        ));
    }

    Ok(Json(submission))
}
