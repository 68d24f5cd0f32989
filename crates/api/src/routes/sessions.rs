//! Route definitions for the `/sessions` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::sessions;
use crate::state::AppState;

/// Routes mounted at `/sessions`.
///
/// ```text
/// POST   /                                   create
/// GET    /{id}                               get_by_id
/// DELETE /{id}                               delete
/// POST   /{id}/image                         upload_image (multipart or raw)
/// POST   /{id}/email                         confirm_email
/// POST   /{id}/email/skip                    skip_email
/// POST   /{id}/proposals/{style}/select      select_proposal
/// POST   /{id}/proposals/{style}/edit        edit_proposal
/// GET    /{id}/proposals/{style}/image       proposal_image
/// DELETE /{id}/error                         dismiss_error
/// POST   /{id}/reset                         reset
/// ```
pub fn router() -> Router<AppState> {
    let proposal_routes = Router::new()
        .route("/select", post(sessions::select_proposal))
        .route("/edit", post(sessions::edit_proposal))
        .route("/image", get(sessions::proposal_image));

    Router::new()
        .route("/", post(sessions::create))
        .route("/{id}", get(sessions::get_by_id).delete(sessions::delete))
        .route("/{id}/image", post(sessions::upload_image))
        .route("/{id}/email", post(sessions::confirm_email))
        .route("/{id}/email/skip", post(sessions::skip_email))
        .route("/{id}/error", delete(sessions::dismiss_error))
        .route("/{id}/reset", post(sessions::reset))
        .nest("/{id}/proposals/{style}", proposal_routes)
}
