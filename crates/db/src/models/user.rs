//! User entity model.

use serde::Serialize;
use sqlx::FromRow;

use petpal_core::types::{DbId, Timestamp};

/// A user row from the `users` table.
///
/// Users are identified by the mini-program openid (`douyin_id`); there is
/// no password or session state on the backend.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub douyin_id: String,
    pub created_at: Timestamp,
}
