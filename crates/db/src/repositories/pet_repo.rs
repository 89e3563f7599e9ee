//! Repository for the `pets` table.

use sqlx::PgPool;

use petpal_core::types::DbId;

use crate::models::pet::{CreatePet, Pet, PetStatus};

/// Column list for `pets` queries.
const COLUMNS: &str = "\
    id, user_id, name, species, gender, personality, hobby, story, \
    generated_image, model_url, preview_url, status, task_id, \
    created_at, updated_at";

/// Provides query operations for pets.
pub struct PetRepo;

impl PetRepo {
    // ── Queries ──────────────────────────────────────────────────────

    /// Create a new pet, returning the inserted row.
    ///
    /// Status starts at `pending`; asset fields stay empty until the
    /// generation task completes (unless a legacy `model_url` was given).
    pub async fn create(pool: &PgPool, input: &CreatePet) -> Result<Pet, sqlx::Error> {
        let query = format!(
            "INSERT INTO pets \
             (user_id, name, species, gender, personality, hobby, story, generated_image, model_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Pet>(&query)
            .bind(input.user_id)
            .bind(&input.name)
            .bind(&input.species)
            .bind(&input.gender)
            .bind(&input.personality)
            .bind(&input.hobby)
            .bind(&input.story)
            .bind(&input.generated_image)
            .bind(&input.model_url)
            .fetch_one(pool)
            .await
    }

    /// Find a pet by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Pet>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pets WHERE id = $1");
        sqlx::query_as::<_, Pet>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The user's most recently created pet, if any.
    pub async fn latest_for_user(pool: &PgPool, user_id: DbId) -> Result<Option<Pet>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM pets \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT 1"
        );
        sqlx::query_as::<_, Pet>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Number of pets owned by a user.
    pub async fn count_for_user(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM pets WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    // ── Generation lifecycle mutations ───────────────────────────────

    /// Associate a generation task id with a pet (set once at submission).
    pub async fn set_task_id(pool: &PgPool, id: DbId, task_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE pets SET task_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(task_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Set the pet's generation status, leaving other fields untouched.
    ///
    /// Idempotent: re-applying the same status produces the same row state.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: PetStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE pets SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record a completed generation: asset locations plus status.
    pub async fn apply_model_result(
        pool: &PgPool,
        id: DbId,
        model_url: &str,
        preview_url: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE pets \
             SET model_url = $2, preview_url = $3, status = $4, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(model_url)
        .bind(preview_url)
        .bind(PetStatus::Completed.as_str())
        .execute(pool)
        .await?;
        Ok(())
    }
}
