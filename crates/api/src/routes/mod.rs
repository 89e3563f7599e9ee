pub mod health;
pub mod images;
pub mod pets;
pub mod prompts;
pub mod tasks;
pub mod uploads;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /users/login                      login (mini-program code exchange)
/// /users/{id}/has-pets              whether the user owns any pet
/// /users/{id}/latest-pet            most recently created pet
///
/// /pets                             create (legacy, no generation)
/// /pets/create-with-model           create + submit 3D generation task
/// /pets/{id}                        pet detail
/// /pets/{id}/task-status            generation polling façade
/// /pets/{id}/chats                  chat records (list, append)
/// /pets/{id}/chat                   AI persona reply
///
/// /tasks/{id}                       raw task snapshot
///
/// /prompts/expand                   memory → 3D prompt expansion
/// /images/stylize                   photo → IP-figure portrait
/// /uploads                          multipart image upload
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/pets", pets::router())
        .nest("/tasks", tasks::router())
        .nest("/prompts", prompts::router())
        .nest("/images", images::router())
        .nest("/uploads", uploads::router())
}
