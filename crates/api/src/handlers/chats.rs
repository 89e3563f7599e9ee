//! Handlers for a pet's chat history records.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use petpal_core::types::DbId;
use petpal_db::repositories::ChatRepo;

use crate::error::AppResult;
use crate::handlers::pets::find_pet;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddChatRequest {
    pub content: String,
    pub is_user: bool,
}

/// POST /api/v1/pets/{id}/chats
///
/// Append a raw chat record (used by clients that render replies locally).
pub async fn add_chat(
    State(state): State<AppState>,
    Path(pet_id): Path<DbId>,
    Json(input): Json<AddChatRequest>,
) -> AppResult<impl IntoResponse> {
    find_pet(&state, pet_id).await?;

    let message = ChatRepo::create(&state.pool, pet_id, &input.content, input.is_user).await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: message })))
}

/// GET /api/v1/pets/{id}/chats
///
/// Full chat history in chronological order.
pub async fn list_chats(
    State(state): State<AppState>,
    Path(pet_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_pet(&state, pet_id).await?;

    let messages = ChatRepo::list_for_pet(&state.pool, pet_id).await?;

    Ok(Json(DataResponse { data: messages }))
}
