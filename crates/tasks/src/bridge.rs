//! Pet status bridge.
//!
//! Task outcomes are reflected onto the owning pet row through this seam.
//! Database errors are logged and swallowed: a failed status write must
//! never take down the worker, and the task record itself still carries
//! the outcome.

use async_trait::async_trait;

use petpal_core::manifest::ModelManifest;
use petpal_core::types::DbId;
use petpal_db::models::pet::PetStatus;
use petpal_db::repositories::PetRepo;
use petpal_db::DbPool;

/// Callbacks applied to the owning pet as a task progresses/finishes.
///
/// Each outcome callback is invoked exactly once per task and must be
/// idempotent if retried.
#[async_trait]
pub trait PetBridge: Send + Sync {
    /// The worker started waiting on the vendor job.
    async fn mark_generating(&self, pet_id: DbId);

    /// The task completed; persist the asset locations and final status.
    async fn apply_completed(&self, pet_id: DbId, manifest: &ModelManifest);

    /// The task failed; only the status changes.
    async fn mark_failed(&self, pet_id: DbId);

    /// The vendor wait exceeded its budget; only the status changes.
    async fn mark_timed_out(&self, pet_id: DbId);
}

/// Production bridge writing through [`PetRepo`].
pub struct PgPetBridge {
    pool: DbPool,
}

impl PgPetBridge {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn set_status(&self, pet_id: DbId, status: PetStatus) {
        if let Err(e) = PetRepo::update_status(&self.pool, pet_id, status).await {
            tracing::error!(pet_id, status = %status, error = %e, "Failed to update pet status");
        } else {
            tracing::info!(pet_id, status = %status, "Pet status updated");
        }
    }
}

#[async_trait]
impl PetBridge for PgPetBridge {
    async fn mark_generating(&self, pet_id: DbId) {
        self.set_status(pet_id, PetStatus::Generating).await;
    }

    async fn apply_completed(&self, pet_id: DbId, manifest: &ModelManifest) {
        let Some(model_url) = manifest.primary_location() else {
            // The materializer guarantees a primary asset on success, so
            // this only happens if a caller bypassed it.
            tracing::error!(pet_id, "Completed manifest has no primary asset");
            self.set_status(pet_id, PetStatus::Failed).await;
            return;
        };

        let preview_url = manifest.preview_url();
        if let Err(e) = PetRepo::apply_model_result(&self.pool, pet_id, model_url, preview_url).await
        {
            tracing::error!(pet_id, error = %e, "Failed to persist model result");
        } else {
            tracing::info!(pet_id, model_url = %model_url, "Pet model result persisted");
        }
    }

    async fn mark_failed(&self, pet_id: DbId) {
        self.set_status(pet_id, PetStatus::Failed).await;
    }

    async fn mark_timed_out(&self, pet_id: DbId) {
        self.set_status(pet_id, PetStatus::Timeout).await;
    }
}
