// src/handlers/auth.rs

use axum::{Form, Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use super::validation_error;
use crate::{
    config::Config,
    error::AppError,
    models::user::{
        CreateUserRequest, LoginForm, LoginRequest, NewUser, RegisterRequest, Role, TokenResponse,
        UserResponse,
    },
    store::{DynRepository, StoreError},
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Registers a new user with the role given in the payload.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(repo): State<DynRepository>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(validation_error)?;

    let email = payload.email.trim().to_lowercase();
    let hashed_password = hash_password(&payload.password)?;

    let user = repo
        .create_user(NewUser {
            email: email.clone(),
            full_name: payload.full_name,
            hashed_password,
            role: payload.role,
        })
        .await
        .map_err(|e| match e {
            StoreError::Duplicate(_) => {
                AppError::BadRequest("Email is already registered".to_string())
            }
            other => {
                tracing::error!("Failed to register user: {:?}", other);
                AppError::from(other)
            }
        })?;

    tracing::info!(user_id = user.id, role = user.role.as_str(), "User registered");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Registers a STUDENT.
pub async fn register_student(
    state: State<DynRepository>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    register(state, Json(payload.with_role(Role::Student))).await
}

/// Registers a TEACHER.
pub async fn register_teacher(
    state: State<DynRepository>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    register(state, Json(payload.with_role(Role::Teacher))).await
}

/// Checks credentials and issues a token. Unknown email and bad password
/// produce the same error.
async fn authenticate(
    repo: &DynRepository,
    config: &Config,
    email: &str,
    password: &str,
) -> Result<TokenResponse, AppError> {
    let email = email.trim().to_lowercase();
    let user = repo.find_user_by_email(&email).await?;

    let invalid = || AppError::AuthError("Incorrect email or password".to_string());
    let user = user.ok_or_else(invalid)?;

    if !verify_password(password, &user.hashed_password)? {
        tracing::warn!(user_id = user.id, "Failed login attempt");
        return Err(invalid());
    }

    let access_token = sign_jwt(user.id, user.role, &config.jwt_secret, config.jwt_expiration)?;

    Ok(TokenResponse {
        access_token,
        token_type: "bearer",
        user_id: user.id,
        role: user.role,
    })
}

/// OAuth2 password flow: form fields `username` (the email) and `password`.
pub async fn login(
    State(repo): State<DynRepository>,
    State(config): State<Config>,
    Form(payload): Form<LoginForm>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(validation_error)?;

    let token = authenticate(&repo, &config, &payload.username, &payload.password).await?;
    Ok(Json(token))
}

/// Same as [`login`] with a JSON body (`email`, `password`).
pub async fn login_json(
    State(repo): State<DynRepository>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(validation_error)?;

    let token = authenticate(&repo, &config, &payload.email, &payload.password).await?;
    Ok(Json(token))
}
