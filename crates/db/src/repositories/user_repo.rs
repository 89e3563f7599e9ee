//! Repository for the `users` table.

use sqlx::PgPool;

use petpal_core::types::DbId;

use crate::models::user::User;

/// Column list for `users` queries.
const COLUMNS: &str = "id, douyin_id, created_at";

/// Provides query operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Find a user by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by their mini-program openid.
    pub async fn find_by_douyin_id(
        pool: &PgPool,
        douyin_id: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE douyin_id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(douyin_id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch the user with this openid, creating it on first login.
    ///
    /// Uses an upsert so concurrent first logins for the same openid
    /// cannot race into a unique-constraint failure.
    pub async fn get_or_create(pool: &PgPool, douyin_id: &str) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (douyin_id) VALUES ($1) \
             ON CONFLICT ON CONSTRAINT uq_users_douyin_id \
             DO UPDATE SET douyin_id = EXCLUDED.douyin_id \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(douyin_id)
            .fetch_one(pool)
            .await
    }
}
