pub mod health;
pub mod sessions;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /sessions                                      create (POST)
/// /sessions/{id}                                 snapshot (GET), drop (DELETE)
/// /sessions/{id}/image                           upload room photo (POST)
/// /sessions/{id}/email                           confirm email, start analysis (POST)
/// /sessions/{id}/email/skip                      bypass email, start analysis (POST)
/// /sessions/{id}/proposals/{style}/select        select for editing (POST)
/// /sessions/{id}/proposals/{style}/edit          submit edit instruction (POST)
/// /sessions/{id}/proposals/{style}/image         current proposal image (GET)
/// /sessions/{id}/error                           dismiss error (DELETE)
/// /sessions/{id}/reset                           reset workflow (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/sessions", sessions::router())
}
