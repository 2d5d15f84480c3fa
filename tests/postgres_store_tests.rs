// tests/postgres_store_tests.rs
//
// Runs against a real database when DATABASE_URL is set; otherwise each test
// returns early.

use chrono::{SubsecRound, Utc};
use gradebook::{
    models::{
        assignment::NewAssignment,
        classroom::{NewClassroom, NewLesson},
        submission::{NewSubmission, Submission, SubmissionState},
        user::{NewUser, Role},
    },
    store::{PgRepository, Repository, StoreError},
};
use sqlx::postgres::PgPoolOptions;

async fn repository() -> Option<PgRepository> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres store test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    Some(PgRepository::new(pool))
}

async fn user(repo: &PgRepository, role: Role) -> i64 {
    repo.create_user(NewUser {
        email: format!("{}_{}@example.com", role.as_str().to_lowercase(), uuid::Uuid::new_v4()),
        full_name: "Store Test".to_string(),
        hashed_password: "not-a-real-hash".to_string(),
        role,
    })
    .await
    .unwrap()
    .id
}

/// Returns (teacher, student, assignment) ids.
async fn fixture(repo: &PgRepository) -> (i64, i64, i64) {
    let teacher = user(repo, Role::Teacher).await;
    let student = user(repo, Role::Student).await;

    let classroom = repo
        .create_classroom(NewClassroom {
            name: "Store".to_string(),
            description: None,
            teacher_id: teacher,
        })
        .await
        .unwrap();
    repo.enroll(classroom.id, student).await.unwrap();

    let lesson = repo
        .create_lesson(NewLesson {
            classroom_id: classroom.id,
            title: "Lesson".to_string(),
            description: None,
            scheduled_at: None,
        })
        .await
        .unwrap();

    let assignment = repo
        .create_assignment(NewAssignment {
            lesson_id: lesson.id,
            title: "Homework".to_string(),
            description: None,
            due_at: None,
            max_score: 100.0,
            is_published: true,
            allow_resubmission: true,
        })
        .await
        .unwrap();

    (teacher, student, assignment.id)
}

fn first_submission(assignment_id: i64, student_id: i64) -> NewSubmission {
    NewSubmission {
        assignment_id,
        student_id,
        state: SubmissionState::SubmittedOnTime,
        submitted_at: Utc::now().trunc_subsecs(6),
        content: Some("answer".to_string()),
        file_key: None,
    }
}

#[tokio::test]
async fn duplicate_pair_is_rejected() {
    let Some(repo) = repository().await else {
        return;
    };
    let (_, student, assignment) = fixture(&repo).await;

    repo.insert_submission(first_submission(assignment, student))
        .await
        .unwrap();
    let err = repo
        .insert_submission(first_submission(assignment, student))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Duplicate(_)));
    assert_eq!(
        repo.find_submissions_for_student(assignment, student)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let Some(repo) = repository().await else {
        return;
    };
    let email = format!("dup_{}@example.com", uuid::Uuid::new_v4());
    let new_user = || NewUser {
        email: email.clone(),
        full_name: "Dup".to_string(),
        hashed_password: "x".to_string(),
        role: Role::Student,
    };

    repo.create_user(new_user()).await.unwrap();
    let err = repo.create_user(new_user()).await.unwrap_err();

    assert!(matches!(err, StoreError::Duplicate(_)));
}

#[tokio::test]
async fn stale_version_update_conflicts() {
    let Some(repo) = repository().await else {
        return;
    };
    let (_, student, assignment) = fixture(&repo).await;
    let stored = repo
        .insert_submission(first_submission(assignment, student))
        .await
        .unwrap();
    assert_eq!(stored.version, 1);

    let mut first = stored.clone();
    first.content = Some("first writer".to_string());
    let saved = repo.update_submission(&first).await.unwrap();
    assert_eq!(saved.version, 2);

    let mut second = stored.clone();
    second.content = Some("second writer".to_string());
    let err = repo.update_submission(&second).await.unwrap_err();
    assert!(matches!(err, StoreError::VersionConflict(id) if id == stored.id));

    let current = repo.find_submission(stored.id).await.unwrap().unwrap();
    assert_eq!(current.content.as_deref(), Some("first writer"));
    assert_eq!(current.version, 2);
}

#[tokio::test]
async fn update_of_unknown_row_is_missing() {
    let Some(repo) = repository().await else {
        return;
    };
    let (_, student, assignment) = fixture(&repo).await;
    let mut ghost = repo
        .insert_submission(first_submission(assignment, student))
        .await
        .unwrap();
    ghost.id = i64::MAX;

    let err = repo.update_submission(&ghost).await.unwrap_err();
    assert!(matches!(err, StoreError::Missing(_)));
}

#[tokio::test]
async fn graded_row_round_trips() {
    let Some(repo) = repository().await else {
        return;
    };
    let (teacher, student, assignment) = fixture(&repo).await;
    let stored = repo
        .insert_submission(first_submission(assignment, student))
        .await
        .unwrap();

    let graded = Submission {
        state: SubmissionState::Graded,
        score: Some(85.5),
        feedback: Some("Good".to_string()),
        graded_at: Some(Utc::now().trunc_subsecs(6)),
        graded_by: Some(teacher),
        ..stored.clone()
    };
    let saved = repo.update_submission(&graded).await.unwrap();

    let loaded = repo.find_submission(stored.id).await.unwrap().unwrap();
    assert_eq!(loaded, saved);
    assert_eq!(loaded.state, SubmissionState::Graded);
    assert_eq!(loaded.grade().map(|g| g.score), Some(85.5));

    let listed = repo.list_submissions(assignment).await.unwrap();
    assert_eq!(listed, vec![loaded]);
}

#[tokio::test]
async fn grade_slot_constraint_rejects_partial_grade() {
    let Some(repo) = repository().await else {
        return;
    };
    let (_, student, assignment) = fixture(&repo).await;
    let stored = repo
        .insert_submission(first_submission(assignment, student))
        .await
        .unwrap();

    // GRADED without grader columns violates the table check.
    let broken = Submission {
        state: SubmissionState::Graded,
        score: Some(10.0),
        ..stored.clone()
    };
    let err = repo.update_submission(&broken).await.unwrap_err();
    assert!(matches!(err, StoreError::Database(_)));

    let current = repo.find_submission(stored.id).await.unwrap().unwrap();
    assert_eq!(current.state, SubmissionState::SubmittedOnTime);
}

#[tokio::test]
async fn enrollment_and_roles_map_to_enum_columns() {
    let Some(repo) = repository().await else {
        return;
    };
    let (teacher, student, _) = fixture(&repo).await;

    assert_eq!(repo.find_user(teacher).await.unwrap().unwrap().role, Role::Teacher);
    assert_eq!(repo.find_user(student).await.unwrap().unwrap().role, Role::Student);

    let classrooms = repo.list_classrooms_for_teacher(teacher).await.unwrap();
    assert_eq!(classrooms.len(), 1);

    // Enrolling again is a no-op.
    repo.enroll(classrooms[0].id, student).await.unwrap();
    assert_eq!(repo.list_enrolled(classrooms[0].id).await.unwrap(), vec![student]);
    assert!(repo.is_enrolled(classrooms[0].id, student).await.unwrap());
}
