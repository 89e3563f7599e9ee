use std::sync::Arc;

use petpal_ark::ArkClient;
use petpal_tasks::TaskManager;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: petpal_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Asynchronous 3D-generation task manager.
    pub tasks: Arc<TaskManager>,
    /// Ark platform client (chat, prompt expansion, image stylization).
    pub ark: Arc<ArkClient>,
    /// Outbound HTTP client for platform calls made directly by handlers.
    pub http: reqwest::Client,
}
