// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::API_PREFIX,
    handlers::{assignments, auth, classrooms, grading, health, lessons, submissions, users},
    state::AppState,
    utils::jwt::{auth_middleware, teacher_middleware},
};

/// Room for multipart framing and the text field on top of the file itself.
const FORM_OVERHEAD_BYTES: usize = 256 * 1024;

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = if allowed_origins.is_empty() {
        vec![
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ]
    } else {
        allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect()
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
}

/// Assembles the main application router.
///
/// * Public: health and auth.
/// * Authenticated: users, submissions.
/// * Teacher only: classrooms, lessons, assignments, grading.
pub fn create_router(state: AppState) -> Router {
    let auth_layer = middleware::from_fn_with_state(state.clone(), auth_middleware);
    let upload_limit = state.config.max_upload_size + FORM_OVERHEAD_BYTES;

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/register/student", post(auth::register_student))
        .route("/register/teacher", post(auth::register_teacher))
        .route("/login", post(auth::login))
        .route("/login/json", post(auth::login_json));

    let user_routes = Router::new()
        .route("/me", get(users::me))
        .route_layer(auth_layer.clone());

    let classroom_routes = Router::new()
        .route(
            "/",
            post(classrooms::create_classroom).get(classrooms::list_classrooms),
        )
        .route("/{id}", get(classrooms::get_classroom))
        .route("/{id}/enroll", post(classrooms::enroll_student));

    let lesson_routes = Router::new()
        .route("/", post(lessons::create_lesson))
        .route(
            "/classrooms/{classroom_id}",
            get(lessons::list_lessons_for_classroom),
        );

    let assignment_routes = Router::new()
        .route("/", post(assignments::create_assignment))
        .route(
            "/lessons/{lesson_id}",
            get(assignments::list_assignments_for_lesson),
        )
        .route("/{id}", get(assignments::get_assignment))
        .route("/{id}/roster", get(assignments::get_roster))
        .route("/{id}/missing", get(assignments::get_missing));

    let grading_routes = Router::new().route(
        "/submissions/{id}/grade",
        post(grading::grade_submission).patch(grading::update_grade),
    );

    // Route layers wrap outward: auth runs first, then the teacher check.
    let teacher_routes = Router::new()
        .nest("/classrooms", classroom_routes)
        .nest("/lessons", lesson_routes)
        .nest("/assignments", assignment_routes)
        .nest("/grading", grading_routes)
        .route_layer(middleware::from_fn(teacher_middleware))
        .route_layer(auth_layer.clone());

    let submission_routes = Router::new()
        .route(
            "/assignments/{assignment_id}/submissions",
            post(submissions::create_submission)
                .layer(DefaultBodyLimit::max(upload_limit))
                .get(submissions::list_submissions_for_assignment),
        )
        .route("/{id}", get(submissions::get_submission))
        .route_layer(auth_layer);

    let api = Router::new()
        .route("/health", get(health::health))
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/submissions", submission_routes)
        .merge(teacher_routes);

    Router::new()
        .route("/health", get(health::health))
        .nest(API_PREFIX, api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.allowed_origins)),
        )
        .with_state(state)
}
