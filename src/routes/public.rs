use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Unauthenticated endpoints. Resource reads go through repository methods
/// that only ever return `approved` rows.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        .route("/health", get(|| async { "ok" }))
        // POST /register
        // Supabase signup plus local profile creation (student or faculty only).
        .route("/register", post(handlers::register_user))
        // GET /resources?stage=...&search=...
        .route("/resources", get(handlers::list_resources))
        // GET /resources/{id}
        .route("/resources/{id}", get(handlers::get_resource))
}
