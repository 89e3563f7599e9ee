//! Handlers for the `/tasks` resource.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/tasks/{id}
///
/// Raw task snapshot. 404 for ids that never existed or were purged by
/// the retention sweep; clients should fall back to the pet's durable
/// status in that case.
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state
        .tasks
        .snapshot(&task_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Task {task_id} not found")))?;

    Ok(Json(DataResponse { data: snapshot }))
}
