//! User management handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::AppState;
use papermind_common::{
    auth,
    db::{models::User, NewUser},
    errors::{AppError, Result},
};

/// Request to register a user
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,

    #[validate(email, length(max = 100))]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// List all users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    Ok(Json(state.repo.list_users().await?))
}

/// Get a user by ID
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<User>> {
    state
        .repo
        .find_user_by_id(id)
        .await?
        .map(Json)
        .ok_or(AppError::UserNotFound { id: id.to_string() })
}

/// Register a user; the password is stored as an argon2 hash. A duplicate
/// that slips past these checks is still rejected by the repository.
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<User>> {
    request.validate()?;

    if state.repo.find_user_by_username(&request.username).await?.is_some() {
        return Err(AppError::Validation {
            message: "Username already taken.".to_string(),
            field: Some("username".to_string()),
        });
    }

    if state.repo.find_user_by_email(&request.email).await?.is_some() {
        return Err(AppError::Validation {
            message: "Email already registered.".to_string(),
            field: Some("email".to_string()),
        });
    }

    let password = request.password;
    let password_hash = tokio::task::spawn_blocking(move || auth::hash_password(&password))
        .await
        .map_err(|e| AppError::Internal {
            message: format!("Password hashing task failed: {}", e),
        })??;

    let user = state
        .repo
        .create_user(NewUser {
            username: request.username,
            email: request.email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = user.id, username = %user.username, "User created");

    Ok(Json(user))
}
