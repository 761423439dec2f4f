use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use ts_rs::TS;

use super::{
    identity::{IdentityProvider, IdentityState},
    policy::AccessPolicy,
};

pub const DEFAULT_LOGIN_TARGET: &str = "/login";
pub const DEFAULT_FALLBACK_TARGET: &str = "/";

/// Decision
///
/// Result of an access evaluation. The routing layer interprets it: render on
/// `Allow`, navigate on `DenyRedirect`, show a neutral loading state (and
/// neither render nor navigate) on `AwaitingIdentity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
#[ts(export)]
pub enum Decision {
    Allow,
    DenyRedirect(String),
    AwaitingIdentity,
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// AccessGate
///
/// Decides whether an identity may enter a region guarded by a policy. Holds
/// only the two redirect targets; evaluation is a pure function of its inputs
/// and never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGate {
    login_target: String,
    default_target: String,
}

impl Default for AccessGate {
    fn default() -> Self {
        Self::new(DEFAULT_LOGIN_TARGET, DEFAULT_FALLBACK_TARGET)
    }
}

impl AccessGate {
    pub fn new(login_target: impl Into<String>, default_target: impl Into<String>) -> Self {
        Self {
            login_target: login_target.into(),
            default_target: default_target.into(),
        }
    }

    pub fn login_target(&self) -> &str {
        &self.login_target
    }

    pub fn default_target(&self) -> &str {
        &self.default_target
    }

    pub fn evaluate(&self, state: &IdentityState, policy: &AccessPolicy) -> Decision {
        let principal = match state {
            IdentityState::Pending => return Decision::AwaitingIdentity,
            IdentityState::Unauthenticated => {
                return Decision::DenyRedirect(self.login_target.clone());
            }
            IdentityState::Authenticated(principal) => principal,
        };

        // Unrecognized roles fall through to the denial below.
        match principal.role.normalize() {
            Ok(role) if policy.admits(role) => Decision::Allow,
            _ => Decision::DenyRedirect(self.default_target.clone()),
        }
    }

    /// Evaluates a region nested under `policies`, outermost first.
    pub fn evaluate_nested(&self, state: &IdentityState, policies: &[AccessPolicy]) -> Decision {
        self.evaluate(state, &AccessPolicy::All(policies.to_vec()))
    }

    pub async fn evaluate_current(
        &self,
        provider: &dyn IdentityProvider,
        policy: &AccessPolicy,
    ) -> Decision {
        let state = provider.current_identity_state().await;
        self.evaluate(&state, policy)
    }

    /// Re-evaluates `policy` every time the watched identity changes.
    pub fn subscribe(
        &self,
        identity: watch::Receiver<IdentityState>,
        policy: AccessPolicy,
    ) -> GateSubscription {
        GateSubscription {
            gate: self.clone(),
            policy,
            identity,
        }
    }
}

/// GateSubscription
///
/// Live view of one region's decision. Dropping it releases the subscription
/// to the identity check; a pending decision is then simply never rendered.
pub struct GateSubscription {
    gate: AccessGate,
    policy: AccessPolicy,
    identity: watch::Receiver<IdentityState>,
}

impl GateSubscription {
    pub fn current(&self) -> Decision {
        let state = self.identity.borrow();
        self.gate.evaluate(&state, &self.policy)
    }

    /// Waits for the next identity change. `None` once the provider is gone.
    pub async fn next(&mut self) -> Option<Decision> {
        self.identity.changed().await.ok()?;
        Some(self.current())
    }
}
