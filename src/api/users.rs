use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use super::{ApiJson, AppError, AppResult, AppState};
use crate::users::UserProfile;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:name", get(get_user).put(replace_user).delete(delete_user))
}

fn validate(user: &UserProfile) -> AppResult<()> {
    if user.name.trim().is_empty() {
        return Err(AppError::InvalidInput("user name is blank".to_string()));
    }
    if user.date_of_birth.trim().is_empty() {
        return Err(AppError::InvalidInput("date_of_birth is blank".to_string()));
    }
    Ok(())
}

async fn create_user(
    State(state): State<AppState>,
    ApiJson(user): ApiJson<UserProfile>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    validate(&user)?;
    state.users.write().await.create(user.clone())?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn list_users(State(state): State<AppState>) -> Json<Vec<UserProfile>> {
    let users = state.users.read().await;
    Json(users.list().to_vec())
}

async fn get_user(State(state): State<AppState>, Path(name): Path<String>) -> AppResult<Json<UserProfile>> {
    let users = state.users.read().await;
    users
        .get(&name)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found("user", name))
}

async fn replace_user(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ApiJson(user): ApiJson<UserProfile>,
) -> AppResult<Json<UserProfile>> {
    validate(&user)?;
    if state.users.write().await.replace(&name, user.clone())? == 0 {
        return Err(AppError::not_found("user", name));
    }
    Ok(Json(user))
}

async fn delete_user(State(state): State<AppState>, Path(name): Path<String>) -> AppResult<StatusCode> {
    if state.users.write().await.delete(&name)? == 0 {
        return Err(AppError::not_found("user", name));
    }
    Ok(StatusCode::NO_CONTENT)
}
