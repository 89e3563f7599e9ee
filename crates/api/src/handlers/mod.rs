//! Request handlers.
//!
//! Each submodule provides async handler functions for one resource.
//! Handlers delegate to the repositories in `petpal-db` and the shared
//! services in `AppState`, mapping errors via [`crate::error::AppError`].

pub mod ai;
pub mod chats;
pub mod pets;
pub mod tasks;
pub mod uploads;
pub mod users;
