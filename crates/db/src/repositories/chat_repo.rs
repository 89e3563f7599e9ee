//! Repository for the `chats` table.

use sqlx::PgPool;

use petpal_core::types::DbId;

use crate::models::chat::ChatMessage;

/// Column list for `chats` queries.
const COLUMNS: &str = "id, pet_id, content, is_user, created_at";

/// Provides query operations for chat messages.
pub struct ChatRepo;

impl ChatRepo {
    /// Append a message to a pet's chat history, returning the inserted row.
    pub async fn create(
        pool: &PgPool,
        pet_id: DbId,
        content: &str,
        is_user: bool,
    ) -> Result<ChatMessage, sqlx::Error> {
        let query = format!(
            "INSERT INTO chats (pet_id, content, is_user) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ChatMessage>(&query)
            .bind(pet_id)
            .bind(content)
            .bind(is_user)
            .fetch_one(pool)
            .await
    }

    /// Full chat history for a pet in chronological order.
    pub async fn list_for_pet(
        pool: &PgPool,
        pet_id: DbId,
    ) -> Result<Vec<ChatMessage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM chats \
             WHERE pet_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, ChatMessage>(&query)
            .bind(pet_id)
            .fetch_all(pool)
            .await
    }
}
