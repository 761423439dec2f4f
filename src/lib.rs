use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Framework-agnostic role-gated access control.
pub mod access;

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod seed;
pub mod storage;

// Routing segregated by protected region (public, member, admin, user management).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use access::AccessGate;
pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_resources, handlers::get_resource, handlers::register_user,
        handlers::get_me, handlers::get_my_resources, handlers::create_resource,
        handlers::flag_resource, handlers::get_presigned_url,
        handlers::list_pending_resources, handlers::approve_resource, handlers::reject_resource,
        handlers::list_open_flags, handlers::resolve_flag, handlers::get_admin_stats,
        handlers::list_users, handlers::update_user
    ),
    components(
        schemas(
            models::Resource, models::CreateResourceRequest, models::DesignStage,
            models::ResourceStatus, models::Flag, models::CreateFlagRequest, models::User,
            models::RegisterUserRequest, models::UpdateUserRequest, models::PresignedUrlRequest,
            models::PresignedUrlResponse, models::AdminDashboardStats, models::UserProfile,
            access::Role,
        )
    ),
    tags(
        (name = "resource-hub", description = "Design resource sharing API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Single, immutable container of every shared service, cloned into each request.
#[derive(Clone)]
pub struct AppState {
    /// Persistence behind the `Repository` trait.
    pub repo: RepositoryState,
    /// Object storage for uploaded resource files.
    pub storage: StorageState,
    pub config: AppConfig,
    /// Access gate carrying this deployment's redirect targets.
    pub gate: AccessGate,
}

impl AppState {
    /// Builds the state with the gate derived from `config`.
    pub fn new(repo: RepositoryState, storage: StorageState, config: AppConfig) -> Self {
        let gate = config.access_gate();
        Self {
            repo,
            storage,
            config,
            gate,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for AccessGate {
    fn from_ref(app_state: &AppState) -> AccessGate {
        app_state.gate.clone()
    }
}

/// create_router
///
/// Assembles every region, the docs and the observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes(&state))
        .nest("/admin", admin::admin_routes(&state))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Request span carrying method, URI and the `x-request-id` set above.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
