use async_trait::async_trait;
use axum::{
    Extension, Json,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    AppState,
    access::{
        AccessGate, AccessPolicy, Decision, IdentityProvider, IdentityState, Principal,
        ProtectedRegion, Role, RoleSource,
    },
    config::{AppConfig, Env},
    models::User,
    repository::RepositoryState,
};

/// Claims
///
/// Payload of the Supabase-issued session JWT.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's UUID, primary key of `public.profiles`.
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
}

/// Why a session could not be resolved. Every variant ends in
/// `IdentityState::Unauthenticated`.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("authorization header is not a bearer token")]
    MalformedHeader,
    #[error("invalid session token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("profile lookup failed: {0}")]
    Lookup(#[from] sqlx::Error),
}

/// RequestIdentity
///
/// Identity provider for a single HTTP request. Resolution order:
/// 1. `x-user-id` header, only in `Env::Local` and only for an existing profile.
/// 2. `Authorization: Bearer <jwt>` validated against the configured secret,
///    followed by a profile lookup so deleted or deactivated accounts lose
///    access immediately.
pub struct RequestIdentity {
    repo: RepositoryState,
    config: AppConfig,
    headers: HeaderMap,
}

impl RequestIdentity {
    pub fn new(repo: RepositoryState, config: AppConfig, headers: &HeaderMap) -> Self {
        Self {
            repo,
            config,
            headers: headers.clone(),
        }
    }

    async fn resolve(&self) -> Result<Option<Principal>, IdentityError> {
        if self.config.env == Env::Local {
            let bypass_id = self
                .headers
                .get("x-user-id")
                .and_then(|value| value.to_str().ok())
                .and_then(|id| Uuid::parse_str(id).ok());
            if let Some(user_id) = bypass_id {
                if let Some(user) = self.repo.get_user(user_id).await? {
                    return Ok(active_principal(user));
                }
            }
        }

        let Some(auth_header) = self.headers.get(header::AUTHORIZATION) else {
            return Ok(None);
        };
        let token = auth_header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(IdentityError::MalformedHeader)?;

        let decoding_key = DecodingKey::from_secret(self.config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
        let user = self.repo.get_user(token_data.claims.sub).await?;

        Ok(user.and_then(active_principal))
    }
}

#[async_trait]
impl IdentityProvider for RequestIdentity {
    async fn current_identity_state(&self) -> IdentityState {
        IdentityState::from_check(self.resolve().await)
    }
}

fn active_principal(user: User) -> Option<Principal> {
    if !user.is_active {
        tracing::debug!(user_id = %user.id, "deactivated account presented a session");
        return None;
    }
    Some(Principal::new(user.id, RoleSource::Token(user.role)))
}

/// Resolves the request's identity once and caches it in the extensions so
/// nested guards and extractors reuse it.
async fn cached_identity(parts: &mut Parts, repo: RepositoryState, config: AppConfig) -> IdentityState {
    if let Some(identity) = parts.extensions.get::<IdentityState>() {
        return identity.clone();
    }
    let identity = RequestIdentity::new(repo, config, &parts.headers)
        .current_identity_state()
        .await;
    parts.extensions.insert(identity.clone());
    identity
}

/// GateRejection
///
/// HTTP rendering of every non-`Allow` decision. The redirect target travels
/// in the body; the client router performs the navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateRejection {
    Unauthenticated { redirect: String },
    Forbidden { redirect: String },
    AwaitingIdentity,
}

impl GateRejection {
    /// `AppConfig::load` refuses equal login and default targets, so the
    /// login target alone identifies a missing session.
    pub fn from_decision(gate: &AccessGate, decision: Decision) -> Option<Self> {
        match decision {
            Decision::Allow => None,
            Decision::AwaitingIdentity => Some(GateRejection::AwaitingIdentity),
            Decision::DenyRedirect(redirect) if redirect == gate.login_target() => {
                Some(GateRejection::Unauthenticated { redirect })
            }
            Decision::DenyRedirect(redirect) => Some(GateRejection::Forbidden { redirect }),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GateRejection::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            GateRejection::Forbidden { .. } => StatusCode::FORBIDDEN,
            GateRejection::AwaitingIdentity => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            GateRejection::Unauthenticated { redirect } => (
                status,
                Json(serde_json::json!({ "error": "authentication required", "redirect": redirect })),
            )
                .into_response(),
            GateRejection::Forbidden { redirect } => (
                status,
                Json(serde_json::json!({ "error": "insufficient role", "redirect": redirect })),
            )
                .into_response(),
            // No redirect while the identity is unknown.
            GateRejection::AwaitingIdentity => (
                status,
                [(header::RETRY_AFTER, "1")],
                Json(serde_json::json!({ "error": "identity check in progress" })),
            )
                .into_response(),
        }
    }
}

/// enforce_region
///
/// Route-layer middleware guarding every route of a [`ProtectedRegion`]. The
/// region is supplied through an `Extension` layer placed outside this one.
/// Nested regions run one guard each; the innermost carries the composed
/// policy.
pub async fn enforce_region(
    State(state): State<AppState>,
    Extension(region): Extension<ProtectedRegion>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let identity = cached_identity(&mut parts, state.repo.clone(), state.config.clone()).await;
    let decision = state.gate.evaluate(&identity, region.policy());

    match GateRejection::from_decision(&state.gate, decision) {
        None => next.run(Request::from_parts(parts, body)).await,
        Some(rejection) => {
            tracing::debug!(
                region = region.path(),
                principal = ?identity.principal().map(|p| p.id),
                status = %rejection.status(),
                "access denied"
            );
            rejection.into_response()
        }
    }
}

/// AuthUser
///
/// A caller holding any recognized role, with that role already normalized.
/// Handlers take this as an argument to learn who is calling.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
    AccessGate: FromRef<S>,
{
    type Rejection = GateRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let gate = AccessGate::from_ref(state);
        let identity =
            cached_identity(parts, RepositoryState::from_ref(state), AppConfig::from_ref(state))
                .await;

        let decision = gate.evaluate(&identity, &AccessPolicy::minimum(Role::Student));
        if let Some(rejection) = GateRejection::from_decision(&gate, decision) {
            return Err(rejection);
        }

        identity
            .principal()
            .and_then(|principal| {
                principal.role.normalize().ok().map(|role| AuthUser {
                    id: principal.id,
                    role,
                })
            })
            .ok_or_else(|| GateRejection::Forbidden {
                redirect: gate.default_target().to_string(),
            })
    }
}
