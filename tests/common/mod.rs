// tests/common/mod.rs

#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc};

use gradebook::{
    config::Config,
    routes,
    state::AppState,
    store::MemoryRepository,
    utils::upload::BlobStore,
};
use serde_json::{Value, json};

pub const PASSWORD: &str = "password123";
pub const MAX_UPLOAD_SIZE: usize = 1024;

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub upload_dir: PathBuf,
}

pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub token: String,
}

/// Spawns the app on a random port with in-memory storage.
pub async fn spawn_app() -> TestApp {
    let upload_dir = std::env::temp_dir().join(format!("gradebook-test-{}", uuid::Uuid::new_v4()));

    let config = Config {
        database_url: None,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        upload_dir: upload_dir.clone(),
        max_upload_size: MAX_UPLOAD_SIZE,
        allowed_origins: vec![],
    };

    let state = AppState {
        repo: Arc::new(MemoryRepository::new()),
        blobs: BlobStore::new(upload_dir.clone()),
        config,
    };

    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        upload_dir,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.address, path)
    }

    pub async fn register(&self, role: &str) -> TestUser {
        let email = format!("{}_{}@example.com", role.to_lowercase(), uuid::Uuid::new_v4());
        let response = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({
                "email": email,
                "full_name": "Test User",
                "password": PASSWORD,
                "role": role
            }))
            .send()
            .await
            .expect("Register failed");
        assert_eq!(response.status().as_u16(), 201);
        let user: Value = response.json().await.unwrap();

        let token = self.login(&email, PASSWORD).await["access_token"]
            .as_str()
            .expect("Token not found")
            .to_string();

        TestUser {
            id: user["id"].as_i64().unwrap(),
            email,
            token,
        }
    }

    pub async fn teacher(&self) -> TestUser {
        self.register("TEACHER").await
    }

    pub async fn student(&self) -> TestUser {
        self.register("STUDENT").await
    }

    pub async fn login(&self, email: &str, password: &str) -> Value {
        self.client
            .post(self.url("/auth/login/json"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Login failed")
            .json::<Value>()
            .await
            .expect("Failed to parse login json")
    }

    pub async fn post_json(&self, user: &TestUser, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(&user.token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn patch_json(&self, user: &TestUser, path: &str, body: Value) -> reqwest::Response {
        self.client
            .patch(self.url(path))
            .bearer_auth(&user.token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, user: &TestUser, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(&user.token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Creates classroom -> lesson -> assignment and returns the classroom and
    /// assignment ids. `assignment` fields override the defaults.
    pub async fn setup_assignment(&self, teacher: &TestUser, assignment: Value) -> (i64, i64) {
        let classroom: Value = self
            .post_json(teacher, "/classrooms", json!({ "name": "Math" }))
            .await
            .json()
            .await
            .unwrap();
        let classroom_id = classroom["id"].as_i64().unwrap();

        let lesson: Value = self
            .post_json(
                teacher,
                "/lessons",
                json!({ "classroom_id": classroom_id, "title": "Fractions" }),
            )
            .await
            .json()
            .await
            .unwrap();

        let mut body = json!({ "lesson_id": lesson["id"], "title": "Homework 1" });
        if let (Some(target), Some(extra)) = (body.as_object_mut(), assignment.as_object()) {
            for (k, v) in extra {
                target.insert(k.clone(), v.clone());
            }
        }
        let response = self.post_json(teacher, "/assignments", body).await;
        assert_eq!(response.status().as_u16(), 201);
        let assignment: Value = response.json().await.unwrap();

        (classroom_id, assignment["id"].as_i64().unwrap())
    }

    pub async fn enroll(&self, teacher: &TestUser, classroom_id: i64, student: &TestUser) {
        let response = self
            .post_json(
                teacher,
                &format!("/classrooms/{}/enroll", classroom_id),
                json!({ "student_id": student.id }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 204);
    }

    pub async fn submit_form(
        &self,
        student: &TestUser,
        assignment_id: i64,
        form: reqwest::multipart::Form,
    ) -> reqwest::Response {
        self.client
            .post(self.url(&format!(
                "/submissions/assignments/{}/submissions",
                assignment_id
            )))
            .bearer_auth(&student.token)
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn submit_text(
        &self,
        student: &TestUser,
        assignment_id: i64,
        content: &str,
    ) -> reqwest::Response {
        let form = reqwest::multipart::Form::new().text("content", content.to_string());
        self.submit_form(student, assignment_id, form).await
    }

    pub async fn grade(
        &self,
        teacher: &TestUser,
        submission_id: i64,
        body: Value,
    ) -> reqwest::Response {
        self.post_json(
            teacher,
            &format!("/grading/submissions/{}/grade", submission_id),
            body,
        )
        .await
    }
}

pub fn days_from_now(days: i64) -> String {
    (chrono::Utc::now() + chrono::Duration::days(days)).to_rfc3339()
}
