//! Route definitions for the `/users` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// POST   /login              -> login
/// GET    /{id}/has-pets      -> has_pets
/// GET    /{id}/latest-pet    -> latest_pet
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(users::login))
        .route("/{id}/has-pets", get(users::has_pets))
        .route("/{id}/latest-pet", get(users::latest_pet))
}
