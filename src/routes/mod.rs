/// Router Module Index
///
/// Splits the API into nested protected regions. Each region's policy is the
/// conjunction of its ancestors' policies and its own:
///
/// - public: no guard.
/// - member: any recognized role.
/// - admin: member AND at least `Admin`.
/// - user management: admin AND at least `SuperAdmin`.
use axum::{Extension, Router, middleware};

use crate::{
    AppState,
    access::{AccessPolicy, ProtectedRegion, Role},
    auth::enforce_region,
};

/// Routes accessible to everyone. Only approved resources are ever returned.
pub mod public;

/// Routes for any signed-in user with a recognized role.
pub mod authenticated;

/// Moderation routes, plus the nested super admin user management region.
pub mod admin;

pub fn member_region() -> ProtectedRegion {
    ProtectedRegion::root("/", AccessPolicy::minimum(Role::Student))
}

pub fn admin_region() -> ProtectedRegion {
    member_region().nest("/admin", AccessPolicy::minimum(Role::Admin))
}

pub fn user_management_region() -> ProtectedRegion {
    admin_region().nest("/users", AccessPolicy::minimum(Role::SuperAdmin))
}

/// guarded
///
/// Wraps every route currently in `router` with the region's guard. The
/// `Extension` layer is added last so it runs first and hands the region to
/// `enforce_region`.
pub fn guarded(
    router: Router<AppState>,
    state: &AppState,
    region: ProtectedRegion,
) -> Router<AppState> {
    router
        .route_layer(middleware::from_fn_with_state(state.clone(), enforce_region))
        .route_layer(Extension(region))
}
