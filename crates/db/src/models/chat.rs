//! Chat message entity model.

use serde::Serialize;
use sqlx::FromRow;

use petpal_core::types::{DbId, Timestamp};

/// A chat message row from the `chats` table.
///
/// `is_user` distinguishes user-authored messages from AI replies; the
/// ordered history of a pet's messages is replayed as conversation context
/// for the reply endpoint.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChatMessage {
    pub id: DbId,
    pub pet_id: DbId,
    pub content: String,
    pub is_user: bool,
    pub created_at: Timestamp,
}
