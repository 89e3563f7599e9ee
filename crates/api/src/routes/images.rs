//! Route definitions for the `/images` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::ai;
use crate::state::AppState;

/// Routes mounted at `/images`.
///
/// ```text
/// POST   /stylize    -> stylize_image
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/stylize", post(ai::stylize_image))
}
