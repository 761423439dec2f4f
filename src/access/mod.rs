//! Role-gated access control.
//!
//! Everything in this module is framework agnostic: an [`AccessGate`] turns an
//! [`IdentityState`] and an [`AccessPolicy`] into a [`Decision`]. The HTTP
//! mapping of decisions lives in `crate::auth`.

pub mod gate;
pub mod identity;
pub mod policy;
pub mod role;

pub use gate::{AccessGate, Decision, GateSubscription};
pub use identity::{IdentityProvider, IdentityState, Principal, WatchIdentityProvider};
pub use policy::{AccessPolicy, ProtectedRegion};
pub use role::{InvalidRole, Role, RoleSource, normalize_role};
