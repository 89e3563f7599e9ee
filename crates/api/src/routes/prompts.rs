//! Route definitions for the `/prompts` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::ai;
use crate::state::AppState;

/// Routes mounted at `/prompts`.
///
/// ```text
/// POST   /expand    -> expand_prompt
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/expand", post(ai::expand_prompt))
}
