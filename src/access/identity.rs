use async_trait::async_trait;
use std::fmt::Display;
use tokio::sync::watch;
use uuid::Uuid;

use super::role::RoleSource;

/// Principal
///
/// An authenticated caller. The role is kept exactly as the identity source
/// supplied it; normalization happens when a policy is evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub id: Uuid,
    pub role: RoleSource,
}

impl Principal {
    pub fn new(id: Uuid, role: impl Into<RoleSource>) -> Self {
        Self {
            id,
            role: role.into(),
        }
    }
}

/// IdentityState
///
/// Outcome of a session check: still resolving, no principal, or a principal.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum IdentityState {
    #[default]
    Pending,
    Unauthenticated,
    Authenticated(Principal),
}

impl IdentityState {
    /// Folds the result of an identity check into a resolved state. A failed
    /// check is `Unauthenticated`, never `Pending`.
    pub fn from_check<E: Display>(result: Result<Option<Principal>, E>) -> Self {
        match result {
            Ok(Some(principal)) => IdentityState::Authenticated(principal),
            Ok(None) => IdentityState::Unauthenticated,
            Err(e) => {
                tracing::warn!(error = %e, "identity check failed, treating caller as unauthenticated");
                IdentityState::Unauthenticated
            }
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            IdentityState::Authenticated(principal) => Some(principal),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, IdentityState::Pending)
    }
}

/// IdentityProvider
///
/// Source of the current identity state. Injected into whatever evaluates
/// access so the gate can be exercised without a session backend.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_identity_state(&self) -> IdentityState;
}

/// WatchIdentityProvider
///
/// Identity provider backed by a `watch` channel. One check is in flight at a
/// time: `begin_check` starts it (state becomes `Pending`) and
/// `complete_check` resolves it. A resolved state is only replaced by
/// starting a fresh check.
pub struct WatchIdentityProvider {
    tx: watch::Sender<IdentityState>,
}

impl WatchIdentityProvider {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(IdentityState::Pending);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<IdentityState> {
        self.tx.subscribe()
    }

    pub fn begin_check(&self) {
        self.tx.send_replace(IdentityState::Pending);
    }

    /// Resolves the in-flight check. Returns `false` and leaves the state alone
    /// when no check is pending.
    pub fn complete_check<E: Display>(&self, result: Result<Option<Principal>, E>) -> bool {
        let resolved = IdentityState::from_check(result);
        self.tx.send_if_modified(|state| {
            if state.is_resolved() {
                return false;
            }
            *state = resolved;
            true
        })
    }
}

impl Default for WatchIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for WatchIdentityProvider {
    async fn current_identity_state(&self) -> IdentityState {
        self.tx.borrow().clone()
    }
}
