// src/handlers/users.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};

use crate::{
    error::AppError, models::user::UserResponse, store::DynRepository, utils::jwt::Claims,
};

/// Returns the currently authenticated user.
pub async fn me(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = repo
        .find_user(claims.user_id()?)
        .await?
        .ok_or(AppError::AuthError("Could not validate credentials".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}
