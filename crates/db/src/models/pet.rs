//! Pet entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use petpal_core::types::{DbId, Timestamp};

/// A pet row from the `pets` table.
///
/// `status`, `model_url`, and `preview_url` are written exclusively by the
/// generation task bridge after the pet is created; `task_id` is set once
/// by the create-with-model handler.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Pet {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub species: String,
    pub gender: Option<String>,
    pub personality: Option<String>,
    pub hobby: Option<String>,
    pub story: Option<String>,
    pub generated_image: Option<String>,
    pub model_url: Option<String>,
    pub preview_url: Option<String>,
    pub status: String,
    pub task_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new pet.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePet {
    pub user_id: DbId,
    pub name: String,
    pub species: String,
    pub gender: Option<String>,
    pub personality: Option<String>,
    pub hobby: Option<String>,
    pub story: Option<String>,
    pub generated_image: Option<String>,
    /// Pre-existing model URL (legacy create path only).
    pub model_url: Option<String>,
}

/// Pet generation lifecycle status.
///
/// Stored as lowercase text in the `status` column. Mutated exclusively by
/// task-completion callbacks, never rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetStatus {
    Pending,
    Generating,
    Completed,
    Failed,
    Timeout,
}

impl PetStatus {
    /// Database column value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for PetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
