//! Handlers for the `/pets` resource: creation, detail, and the
//! generation-status polling façade.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use petpal_core::error::CoreError;
use petpal_core::prompt::{pet_description, PetTraits};
use petpal_core::types::DbId;
use petpal_db::models::pet::{CreatePet, Pet, PetStatus};
use petpal_db::repositories::{PetRepo, UserRepo};
use petpal_tasks::{TaskParams, TaskSnapshot};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of the combined create-and-generate endpoint. A pre-existing
/// model URL is deliberately not accepted here; the generation task owns
/// the asset fields.
#[derive(Debug, Deserialize)]
pub struct CreatePetWithModel {
    pub user_id: DbId,
    pub name: String,
    pub species: String,
    pub gender: Option<String>,
    pub personality: Option<String>,
    pub hobby: Option<String>,
    pub story: Option<String>,
    pub generated_image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateWithModelResponse {
    pub pet_id: DbId,
    pub task_id: String,
    pub status: PetStatus,
}

/// Polling façade payload: durable pet state merged with the in-memory
/// task snapshot (absent once the task has been swept).
#[derive(Debug, Serialize)]
pub struct PetTaskStatus {
    pub pet_id: DbId,
    pub pet_status: String,
    pub task_id: Option<String>,
    pub task: Option<TaskSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

/// POST /api/v1/pets
///
/// Plain pet creation without 3D generation (legacy client path).
pub async fn create_pet(
    State(state): State<AppState>,
    Json(input): Json<CreatePet>,
) -> AppResult<impl IntoResponse> {
    find_user(&state, input.user_id).await?;

    let pet = PetRepo::create(&state.pool, &input).await?;
    tracing::info!(pet_id = pet.id, user_id = pet.user_id, "Pet created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: pet })))
}

/// POST /api/v1/pets/create-with-model
///
/// Create the pet in `pending` status and submit the asynchronous 3D
/// generation task. Returns 202 immediately; clients poll
/// `/pets/{id}/task-status` until a terminal state appears.
pub async fn create_with_model(
    State(state): State<AppState>,
    Json(input): Json<CreatePetWithModel>,
) -> AppResult<impl IntoResponse> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("Pet name must not be empty".to_string()));
    }
    find_user(&state, input.user_id).await?;

    let create = CreatePet {
        user_id: input.user_id,
        name: input.name.clone(),
        species: input.species.clone(),
        gender: input.gender.clone(),
        personality: input.personality.clone(),
        hobby: input.hobby.clone(),
        story: input.story.clone(),
        generated_image: input.generated_image.clone(),
        model_url: None,
    };
    let pet = PetRepo::create(&state.pool, &create).await?;

    // Image mode when a usable portrait URL exists, text mode otherwise.
    // The two are mutually exclusive at the vendor.
    let image_url = input
        .generated_image
        .as_deref()
        .filter(|url| url.starts_with("http://") || url.starts_with("https://"));

    let params = match image_url {
        Some(url) => TaskParams {
            prompt: None,
            image_url: Some(url.to_string()),
            pet_id: Some(pet.id),
        },
        None => {
            let traits = PetTraits {
                name: input.name,
                species: Some(input.species),
                gender: input.gender,
                personality: input.personality,
                hobby: input.hobby,
                story: input.story,
            };
            TaskParams {
                prompt: Some(pet_description(&traits)),
                image_url: None,
                pet_id: Some(pet.id),
            }
        }
    };

    let task_id = state.tasks.submit(params).await?;
    PetRepo::set_task_id(&state.pool, pet.id, &task_id).await?;

    tracing::info!(pet_id = pet.id, task_id = %task_id, "Pet created, generation task submitted");

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: CreateWithModelResponse {
                pet_id: pet.id,
                task_id,
                status: PetStatus::Pending,
            },
        }),
    ))
}

/// GET /api/v1/pets/{id}
pub async fn get_pet(
    State(state): State<AppState>,
    Path(pet_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let pet = find_pet(&state, pet_id).await?;
    Ok(Json(DataResponse { data: pet }))
}

/// GET /api/v1/pets/{id}/task-status
///
/// Generation status for polling clients. The task section is `null`
/// when the pet has no task or the task record has been swept; the
/// durable pet status remains authoritative either way.
pub async fn task_status(
    State(state): State<AppState>,
    Path(pet_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let pet = find_pet(&state, pet_id).await?;

    let task = match pet.task_id.as_deref() {
        Some(task_id) => state.tasks.snapshot(task_id).await,
        None => None,
    };

    let (model_url, preview_url) = if pet.status == PetStatus::Completed.as_str() {
        (pet.model_url.clone(), pet.preview_url.clone())
    } else {
        (None, None)
    };

    Ok(Json(DataResponse {
        data: PetTaskStatus {
            pet_id: pet.id,
            pet_status: pet.status,
            task_id: pet.task_id,
            task,
            model_url,
            preview_url,
        },
    }))
}

pub(crate) async fn find_pet(state: &AppState, pet_id: DbId) -> AppResult<Pet> {
    PetRepo::find_by_id(&state.pool, pet_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Pet",
            id: pet_id,
        }))
}

async fn find_user(state: &AppState, user_id: DbId) -> AppResult<()> {
    UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .map(|_| ())
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))
}
