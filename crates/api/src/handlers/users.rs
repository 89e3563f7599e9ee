//! Handlers for the `/users` resource.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use petpal_core::error::CoreError;
use petpal_core::types::DbId;
use petpal_db::models::user::User;
use petpal_db::repositories::{PetRepo, UserRepo};

use crate::douyin;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: DbId,
    pub douyin_id: String,
}

#[derive(Debug, Serialize)]
pub struct HasPetsResponse {
    pub has_pets: bool,
}

/// POST /api/v1/users/login
///
/// Exchange a mini-program login code for the user's backend identity,
/// creating the user row on first login.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    if input.code.trim().is_empty() {
        return Err(AppError::BadRequest("Missing code parameter".to_string()));
    }

    let openid = douyin::resolve_openid(&state.http, &state.config, &input.code).await;
    let user = UserRepo::get_or_create(&state.pool, &openid).await?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(DataResponse {
        data: LoginResponse {
            user_id: user.id,
            douyin_id: user.douyin_id,
        },
    }))
}

/// GET /api/v1/users/{id}/has-pets
pub async fn has_pets(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_user(&state.pool, user_id).await?;
    let count = PetRepo::count_for_user(&state.pool, user_id).await?;

    Ok(Json(DataResponse {
        data: HasPetsResponse {
            has_pets: count > 0,
        },
    }))
}

/// GET /api/v1/users/{id}/latest-pet
///
/// The user's most recently created pet, 404 when they have none.
pub async fn latest_pet(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_user(&state.pool, user_id).await?;

    let pet = PetRepo::latest_for_user(&state.pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No pets found for this user".to_string()))?;

    Ok(Json(DataResponse { data: pet }))
}

async fn find_user(pool: &petpal_db::DbPool, user_id: DbId) -> AppResult<User> {
    UserRepo::find_by_id(pool, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))
}
