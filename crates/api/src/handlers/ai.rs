//! Handlers backed by the Ark platform: pet chat replies, prompt
//! expansion, and image stylization.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use petpal_ark::{ChatTurn, PetPersona, StylizeOptions};
use petpal_core::types::DbId;
use petpal_db::models::pet::Pet;
use petpal_db::repositories::ChatRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::pets::find_pet;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub id: i64,
    pub content: String,
    /// Duplicate of `content` kept for the mini-program client.
    pub text: String,
    pub mood_level: i32,
}

#[derive(Debug, Deserialize)]
pub struct ExpandRequest {
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct ExpandResponse {
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct StylizeRequest {
    pub description: String,
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct StylizeResponse {
    pub url: String,
}

/// POST /api/v1/pets/{id}/chat
///
/// Persist the user's message, generate the pet's persona reply, persist
/// it, and return it.
pub async fn chat_with_pet(
    State(state): State<AppState>,
    Path(pet_id): Path<DbId>,
    Json(input): Json<ChatRequest>,
) -> AppResult<impl IntoResponse> {
    if input.message.trim().is_empty() {
        return Err(AppError::BadRequest("Message must not be empty".to_string()));
    }

    let pet = find_pet(&state, pet_id).await?;

    // History is loaded before the new message is stored so the message
    // is not replayed twice in the model context.
    let history: Vec<ChatTurn> = ChatRepo::list_for_pet(&state.pool, pet_id)
        .await?
        .into_iter()
        .map(|m| {
            if m.is_user {
                ChatTurn::user(m.content)
            } else {
                ChatTurn::assistant(m.content)
            }
        })
        .collect();

    // Keep the user's message even if the reply fails below.
    ChatRepo::create(&state.pool, pet_id, &input.message, true).await?;

    let persona = build_persona(&pet);
    let reply = state
        .ark
        .pet_reply(&persona, &history, &input.message)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    ChatRepo::create(&state.pool, pet_id, &reply.main_reply, false).await?;

    Ok(Json(DataResponse {
        data: ChatReply {
            id: chrono::Utc::now().timestamp_millis(),
            content: reply.main_reply.clone(),
            text: reply.main_reply,
            mood_level: reply.intimacy_level,
        },
    }))
}

/// POST /api/v1/prompts/expand
///
/// Expand a user's pet memory into a compact 3D generation prompt.
pub async fn expand_prompt(
    State(state): State<AppState>,
    Json(input): Json<ExpandRequest>,
) -> AppResult<impl IntoResponse> {
    if input.description.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Description must not be empty".to_string(),
        ));
    }

    let prompt = state
        .ark
        .expand_model_prompt(&input.description)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    Ok(Json(DataResponse {
        data: ExpandResponse { prompt },
    }))
}

/// POST /api/v1/images/stylize
///
/// Generate the stylized IP-figure portrait used as generation input.
pub async fn stylize_image(
    State(state): State<AppState>,
    Json(input): Json<StylizeRequest>,
) -> AppResult<impl IntoResponse> {
    if input.image_url.trim().is_empty() {
        return Err(AppError::BadRequest("Image URL must not be empty".to_string()));
    }

    let url = state
        .ark
        .stylize_image(&input.description, &input.image_url, &StylizeOptions::default())
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    Ok(Json(DataResponse {
        data: StylizeResponse { url },
    }))
}

/// Assemble the chat persona from the pet row plus ambient context.
///
/// Weather is a fixed placeholder until a weather source exists; the
/// model only uses it for flavour.
fn build_persona(pet: &Pet) -> PetPersona {
    PetPersona {
        pet_name: pet.name.clone(),
        species_breed: pet.species.clone(),
        gender: pet.gender.clone().unwrap_or_default(),
        birthday: "2023-01-01".to_string(),
        appearance: pet
            .story
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "可爱的宠物".to_string()),
        core_personality: pet
            .personality
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "友好".to_string()),
        likes: pet
            .hobby
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "和主人玩耍".to_string()),
        current_time: chrono::Local::now().format("%Y-%m-%d %H:%M").to_string(),
        weather: "晴朗".to_string(),
        temperature: "25℃".to_string(),
        wind: "微风".to_string(),
    }
}
