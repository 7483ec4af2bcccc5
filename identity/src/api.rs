//! HTTP surface of the identity service.

use crate::service::UserService;
use crate::store::UserStore;
use arcana_core::model::UserId;
use arcana_web::ApiError;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared handler state.
pub struct AppState<S> {
    /// The user service.
    pub users: Arc<UserService<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
        }
    }
}

/// Build the identity router.
pub fn router<S: UserStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/users", post(create_user::<S>))
        .route("/users/:id", get(get_user::<S>).delete(delete_user::<S>))
        .route("/internal/users/:id", get(user_exists::<S>))
        .route("/health", get(health))
        .route("/ready", get(ready::<S>))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct CreateUserRequest {
    username: String,
}

#[derive(Debug, Serialize)]
struct CreatedResponse {
    id: UserId,
}

#[derive(Debug, Serialize)]
struct UserResponse {
    id: UserId,
    username: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

async fn create_user<S: UserStore>(
    State(state): State<AppState<S>>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let user = state.users.create(&request.username).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: user.id })))
}

async fn get_user<S: UserStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<UserId>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.get(id).await?;
    Ok(Json(UserResponse {
        id: user.id,
        username: user.username,
        created_at: user.created_at,
    }))
}

async fn delete_user<S: UserStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<UserId>,
) -> Result<StatusCode, ApiError> {
    state.users.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Existence probe for the spreads service. No body either way.
async fn user_exists<S: UserStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<UserId>,
) -> Result<StatusCode, ApiError> {
    if state.users.exists(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Ok(StatusCode::NOT_FOUND)
    }
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn ready<S: UserStore>(State(state): State<AppState<S>>) -> Result<StatusCode, ApiError> {
    state.users.ready().await?;
    Ok(StatusCode::OK)
}
