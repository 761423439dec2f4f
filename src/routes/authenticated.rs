use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

use super::{guarded, member_region};

/// Authenticated Router Module
///
/// Routes for any caller whose session resolves to a recognized role.
/// Students and faculty upload here; every submission enters the review queue.
pub fn authenticated_routes(state: &AppState) -> Router<AppState> {
    let router = Router::<AppState>::new()
        // GET /me
        .route("/me", get(handlers::get_me))
        // GET /me/resources
        // The caller's own uploads, including pending and rejected ones.
        .route("/me/resources", get(handlers::get_my_resources))
        // POST /upload/presigned
        // Ten-minute presigned PUT URL; the file goes straight to object storage.
        .route("/upload/presigned", post(handlers::get_presigned_url))
        // POST /resources
        // Method routing merges with the public GET /resources.
        .route("/resources", post(handlers::create_resource))
        // POST /resources/{id}/flag
        .route("/resources/{id}/flag", post(handlers::flag_resource));

    guarded(router, state, member_region())
}
