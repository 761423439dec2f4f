use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch},
};

use super::{admin_region, guarded, user_management_region};

/// Admin Router Module
///
/// Nested under `/admin`. Every route passes the admin guard; the user
/// management routes additionally pass the super admin guard.
pub fn admin_routes(state: &AppState) -> Router<AppState> {
    let user_management = Router::new()
        // GET /admin/users
        .route("/users", get(handlers::list_users))
        // PATCH /admin/users/{id}  body: { role, isActive }
        .route("/users/{id}", patch(handlers::update_user));

    let moderation = Router::new()
        // GET /admin/stats
        .route("/stats", get(handlers::get_admin_stats))
        // GET /admin/resources/pending
        .route("/resources/pending", get(handlers::list_pending_resources))
        // PATCH /admin/resources/{id}/approve
        .route("/resources/{id}/approve", patch(handlers::approve_resource))
        // PATCH /admin/resources/{id}/reject
        .route("/resources/{id}/reject", patch(handlers::reject_resource))
        // GET /admin/flags
        .route("/flags", get(handlers::list_open_flags))
        // PATCH /admin/flags/{id}/resolve
        .route("/flags/{id}/resolve", patch(handlers::resolve_flag))
        .merge(guarded(user_management, state, user_management_region()));

    guarded(moderation, state, admin_region())
}
