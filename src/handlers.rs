use crate::{
    AppState,
    access::Role,
    auth::AuthUser,
    error::{ApiError, ApiResult},
    models::{
        AdminDashboardStats, CreateFlagRequest, CreateResourceRequest, DesignStage, Flag,
        PresignedUrlRequest, PresignedUrlResponse, RegisterUserRequest, Resource, ResourceStatus,
        UpdateUserRequest, User, UserProfile,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// ResourceFilter
///
/// Query parameters accepted by GET /resources.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ResourceFilter {
    /// Only resources tagged with this design stage.
    pub stage: Option<DesignStage>,
    /// Case-insensitive match against title and description.
    pub search: Option<String>,
}

/// Minimal view of the Supabase /auth/v1/signup response.
#[derive(Deserialize)]
struct SupabaseAuthResponse {
    id: Uuid,
}

// --- Public ---

/// list_resources
///
/// [Public Route] Approved resources, newest first.
#[utoipa::path(
    get,
    path = "/resources",
    params(ResourceFilter),
    responses((status = 200, description = "Approved resources", body = [Resource]))
)]
pub async fn list_resources(
    State(state): State<AppState>,
    Query(filter): Query<ResourceFilter>,
) -> ApiResult<Json<Vec<Resource>>> {
    let resources = state
        .repo
        .list_approved_resources(filter.stage, filter.search)
        .await?;
    Ok(Json(resources))
}

/// get_resource
///
/// [Public Route] A single approved resource. Pending and rejected
/// submissions are indistinguishable from missing ones.
#[utoipa::path(
    get,
    path = "/resources/{id}",
    params(("id" = Uuid, Path, description = "Resource ID")),
    responses(
        (status = 200, description = "Found", body = Resource),
        (status = 404, description = "Not found or not approved")
    )
)]
pub async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Resource>> {
    state
        .repo
        .get_approved_resource(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// register_user
///
/// [Public Route] Creates the Supabase auth account, then mirrors it into
/// `public.profiles` under the same UUID. Only student and faculty roles can
/// be self-assigned.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 200, description = "Registered", body = User),
        (status = 400, description = "Rejected role or signup refused")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> ApiResult<Json<User>> {
    let role = payload
        .role
        .normalize()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if !role.is_self_assignable() {
        return Err(ApiError::BadRequest(format!(
            "role `{role}` cannot be self-assigned"
        )));
    }

    let supabase_url = state
        .config
        .supabase_url
        .as_deref()
        .ok_or(ApiError::NotConfigured("SUPABASE_URL"))?;
    let supabase_key = state
        .config
        .supabase_key
        .as_deref()
        .ok_or(ApiError::NotConfigured("SUPABASE_KEY"))?;

    let response = reqwest::Client::new()
        .post(format!("{}/auth/v1/signup", supabase_url))
        .header("apikey", supabase_key)
        .json(&serde_json::json!({ "email": payload.email, "password": payload.password }))
        .send()
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    if !response.status().is_success() {
        // Duplicate email, weak password and the like.
        return Err(ApiError::BadRequest("signup was refused".to_string()));
    }

    let account = response
        .json::<SupabaseAuthResponse>()
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    let user = state
        .repo
        .create_user(User {
            id: account.id,
            email: payload.email,
            role: role.as_str().to_string(),
            is_active: true,
        })
        .await?;

    tracing::info!(user_id = %user.id, role = %role, "registered user");
    Ok(Json(user))
}

// --- Authenticated ---

/// get_me
///
/// [Authenticated Route] The caller's profile with its canonical role.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(
    AuthUser { id, role }: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<UserProfile>> {
    let user = state.repo.get_user(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(UserProfile {
        id,
        email: user.email,
        role,
        avatar_url: Some(format!(
            "https://api.dicebear.com/7.x/avataaars/svg?seed={}",
            id
        )),
    }))
}

/// get_my_resources
///
/// [Authenticated Route] Everything the caller uploaded, in any review state.
#[utoipa::path(
    get,
    path = "/me/resources",
    responses((status = 200, description = "My resources", body = [Resource]))
)]
pub async fn get_my_resources(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Resource>>> {
    Ok(Json(state.repo.get_my_resources(id).await?))
}

/// create_resource
///
/// [Authenticated Route] Submits a resource for review. The owner is always
/// the caller and the status is always `pending`.
#[utoipa::path(
    post,
    path = "/resources",
    request_body = CreateResourceRequest,
    responses(
        (status = 201, description = "Submitted for review", body = Resource),
        (status = 400, description = "Missing title or file")
    )
)]
pub async fn create_resource(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateResourceRequest>,
) -> ApiResult<(StatusCode, Json<Resource>)> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".to_string()));
    }
    if payload.file_key.trim().is_empty() {
        return Err(ApiError::BadRequest("file_key is required".to_string()));
    }

    let resource = state.repo.create_resource(payload, id).await?;
    tracing::info!(resource_id = %resource.id, owner_id = %id, "resource submitted");
    Ok((StatusCode::CREATED, Json(resource)))
}

/// flag_resource
///
/// [Authenticated Route] Reports a resource to the moderators.
#[utoipa::path(
    post,
    path = "/resources/{id}/flag",
    params(("id" = Uuid, Path, description = "Resource ID")),
    request_body = CreateFlagRequest,
    responses(
        (status = 201, description = "Flag recorded", body = Flag),
        (status = 404, description = "Not found")
    )
)]
pub async fn flag_resource(
    AuthUser { id: reporter_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(resource_id): Path<Uuid>,
    Json(payload): Json<CreateFlagRequest>,
) -> ApiResult<(StatusCode, Json<Flag>)> {
    let reason = payload.reason.trim();
    if reason.is_empty() {
        return Err(ApiError::BadRequest("reason is required".to_string()));
    }

    let flag = state
        .repo
        .flag_resource(resource_id, reporter_id, reason.to_string())
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok((StatusCode::CREATED, Json(flag)))
}

/// get_presigned_url
///
/// [Authenticated Route] Short-lived upload URL for a resource file. The
/// object key is generated here; only the extension comes from the caller.
#[utoipa::path(
    post,
    path = "/upload/presigned",
    request_body = PresignedUrlRequest,
    responses((status = 200, description = "URL", body = PresignedUrlResponse))
)]
pub async fn get_presigned_url(
    _: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> ApiResult<Json<PresignedUrlResponse>> {
    let extension = std::path::Path::new(&payload.filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("bin");
    let object_key = format!("uploads/{}.{}", Uuid::new_v4(), extension);

    let upload_url = state
        .storage
        .get_presigned_upload_url(&object_key, &payload.file_type)
        .await
        .map_err(ApiError::Storage)?;

    Ok(Json(PresignedUrlResponse {
        upload_url,
        resource_key: object_key,
    }))
}

// --- Admin ---

/// list_pending_resources
///
/// [Admin Route] The review queue, oldest submission first.
#[utoipa::path(
    get,
    path = "/admin/resources/pending",
    responses((status = 200, description = "Pending resources", body = [Resource]))
)]
pub async fn list_pending_resources(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Resource>>> {
    Ok(Json(state.repo.list_pending_resources().await?))
}

async fn review(
    state: &AppState,
    id: Uuid,
    status: ResourceStatus,
    reviewer: &AuthUser,
) -> ApiResult<Json<Resource>> {
    let resource = state
        .repo
        .review_resource(id, status, reviewer.id)
        .await?
        .ok_or(ApiError::NotFound)?;
    tracing::info!(resource_id = %id, reviewer_id = %reviewer.id, %status, "resource reviewed");
    Ok(Json(resource))
}

/// approve_resource
///
/// [Admin Route] Publishes a pending resource.
#[utoipa::path(
    patch,
    path = "/admin/resources/{id}/approve",
    params(("id" = Uuid, Path, description = "Resource ID")),
    responses(
        (status = 200, description = "Approved", body = Resource),
        (status = 404, description = "Not found or already reviewed")
    )
)]
pub async fn approve_resource(
    reviewer: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Resource>> {
    review(&state, id, ResourceStatus::Approved, &reviewer).await
}

/// reject_resource
///
/// [Admin Route] Rejects a pending resource.
#[utoipa::path(
    patch,
    path = "/admin/resources/{id}/reject",
    params(("id" = Uuid, Path, description = "Resource ID")),
    responses(
        (status = 200, description = "Rejected", body = Resource),
        (status = 404, description = "Not found or already reviewed")
    )
)]
pub async fn reject_resource(
    reviewer: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Resource>> {
    review(&state, id, ResourceStatus::Rejected, &reviewer).await
}

/// list_open_flags
#[utoipa::path(
    get,
    path = "/admin/flags",
    responses((status = 200, description = "Unresolved flags", body = [Flag]))
)]
pub async fn list_open_flags(State(state): State<AppState>) -> ApiResult<Json<Vec<Flag>>> {
    Ok(Json(state.repo.list_open_flags().await?))
}

/// resolve_flag
#[utoipa::path(
    patch,
    path = "/admin/flags/{id}/resolve",
    params(("id" = Uuid, Path, description = "Flag ID")),
    responses(
        (status = 204, description = "Resolved"),
        (status = 404, description = "Not found or already resolved")
    )
)]
pub async fn resolve_flag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.repo.resolve_flag(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// get_admin_stats
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses((status = 200, description = "Stats", body = AdminDashboardStats))
)]
pub async fn get_admin_stats(State(state): State<AppState>) -> ApiResult<Json<AdminDashboardStats>> {
    Ok(Json(state.repo.get_stats().await?))
}

// --- User management (super admin) ---

/// list_users
#[utoipa::path(
    get,
    path = "/admin/users",
    responses((status = 200, description = "All users", body = [User]))
)]
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.repo.list_users().await?))
}

/// update_user
///
/// [Super Admin Route] Changes a user's role and/or active flag. The role may
/// arrive as a token or as `{ "name": ... }`; unknown roles are rejected
/// rather than stored. Callers can neither deactivate nor demote themselves.
#[utoipa::path(
    patch,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 400, description = "Invalid role, self-deactivation or self-demotion"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_user(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    let role: Option<Role> = payload
        .role
        .as_ref()
        .map(|source| source.normalize())
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if role.is_none() && payload.is_active.is_none() {
        return Err(ApiError::BadRequest("nothing to update".to_string()));
    }
    if id == caller.id && payload.is_active == Some(false) {
        return Err(ApiError::BadRequest(
            "you cannot deactivate your own account".to_string(),
        ));
    }
    if id == caller.id && role.is_some_and(|role| role < caller.role) {
        return Err(ApiError::BadRequest(
            "you cannot lower your own role".to_string(),
        ));
    }

    let user = state
        .repo
        .update_user(id, role, payload.is_active)
        .await?
        .ok_or(ApiError::NotFound)?;

    tracing::info!(
        user_id = %id,
        changed_by = %caller.id,
        role = ?role,
        is_active = ?payload.is_active,
        "user updated"
    );
    Ok(Json(user))
}
