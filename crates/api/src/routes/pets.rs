//! Route definitions for the `/pets` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{ai, chats, pets};
use crate::state::AppState;

/// Routes mounted at `/pets`.
///
/// ```text
/// POST   /                      -> create_pet
/// POST   /create-with-model     -> create_with_model
/// GET    /{id}                  -> get_pet
/// GET    /{id}/task-status      -> task_status
/// GET    /{id}/chats            -> list_chats
/// POST   /{id}/chats            -> add_chat
/// POST   /{id}/chat             -> chat_with_pet
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(pets::create_pet))
        .route("/create-with-model", post(pets::create_with_model))
        .route("/{id}", get(pets::get_pet))
        .route("/{id}/task-status", get(pets::task_status))
        .route("/{id}/chats", get(chats::list_chats).post(chats::add_chat))
        .route("/{id}/chat", post(ai::chat_with_pet))
}
