//! Route definitions for the `/tasks` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::tasks;
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET    /{id}    -> get_task
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(tasks::get_task))
}
