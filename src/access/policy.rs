use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::role::Role;

/// AccessPolicy
///
/// Declarative requirement attached to a protected region. Policies are plain
/// data; checking one against a role has no side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "roles", rename_all = "snake_case")]
pub enum AccessPolicy {
    /// Admits the given role and everything above it.
    MinimumRole(Role),
    /// Admits exactly the listed roles.
    AllowSet(BTreeSet<Role>),
    /// Admits a role only if every member policy does. The empty conjunction
    /// admits any recognized role.
    All(Vec<AccessPolicy>),
}

impl AccessPolicy {
    pub fn minimum(role: Role) -> Self {
        AccessPolicy::MinimumRole(role)
    }

    pub fn allow<I>(roles: I) -> Self
    where
        I: IntoIterator<Item = Role>,
    {
        AccessPolicy::AllowSet(roles.into_iter().collect())
    }

    /// Conjunction of `self` (outer) and `inner`. Nested conjunctions are
    /// flattened so the composed policy stays one level deep.
    pub fn and(self, inner: AccessPolicy) -> Self {
        let mut parts = match self {
            AccessPolicy::All(parts) => parts,
            other => vec![other],
        };
        match inner {
            AccessPolicy::All(more) => parts.extend(more),
            other => parts.push(other),
        }
        AccessPolicy::All(parts)
    }

    pub fn admits(&self, role: Role) -> bool {
        match self {
            AccessPolicy::MinimumRole(minimum) => role >= *minimum,
            AccessPolicy::AllowSet(allowed) => allowed.contains(&role),
            AccessPolicy::All(parts) => parts.iter().all(|policy| policy.admits(role)),
        }
    }
}

/// ProtectedRegion
///
/// A named area of the API together with its effective policy. A child region
/// created with [`ProtectedRegion::nest`] carries the conjunction of every
/// ancestor's policy with its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedRegion {
    path: String,
    policy: AccessPolicy,
}

impl ProtectedRegion {
    pub fn root(path: impl Into<String>, policy: AccessPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
        }
    }

    pub fn nest(&self, segment: &str, policy: AccessPolicy) -> Self {
        let path = format!(
            "{}/{}",
            self.path.trim_end_matches('/'),
            segment.trim_start_matches('/')
        );
        Self {
            path,
            policy: self.policy.clone().and(policy),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_role_admits_equal_and_higher() {
        let policy = AccessPolicy::minimum(Role::Faculty);
        assert!(!policy.admits(Role::Student));
        assert!(policy.admits(Role::Faculty));
        assert!(policy.admits(Role::Admin));
        assert!(policy.admits(Role::SuperAdmin));
    }

    #[test]
    fn allow_set_is_exact_membership() {
        let policy = AccessPolicy::allow([Role::Student, Role::SuperAdmin]);
        assert!(policy.admits(Role::Student));
        assert!(!policy.admits(Role::Faculty));
        assert!(!policy.admits(Role::Admin));
        assert!(policy.admits(Role::SuperAdmin));
    }

    #[test]
    fn and_flattens_nested_conjunctions() {
        let composed = AccessPolicy::minimum(Role::Student)
            .and(AccessPolicy::minimum(Role::Admin))
            .and(AccessPolicy::minimum(Role::SuperAdmin));

        assert_eq!(
            composed,
            AccessPolicy::All(vec![
                AccessPolicy::minimum(Role::Student),
                AccessPolicy::minimum(Role::Admin),
                AccessPolicy::minimum(Role::SuperAdmin),
            ])
        );
    }

    #[test]
    fn empty_conjunction_admits_everyone() {
        let policy = AccessPolicy::All(vec![]);
        assert!(Role::ALL.iter().all(|role| policy.admits(*role)));
    }

    #[test]
    fn nested_region_composes_path_and_policy() {
        let admin = ProtectedRegion::root("/admin", AccessPolicy::minimum(Role::Admin));
        let users = admin.nest("/users", AccessPolicy::allow([Role::SuperAdmin]));

        assert_eq!(users.path(), "/admin/users");
        assert!(!users.policy().admits(Role::Admin));
        assert!(users.policy().admits(Role::SuperAdmin));
    }

    #[test]
    fn policy_serializes_as_tagged_data() {
        let json = serde_json::to_value(AccessPolicy::minimum(Role::Admin)).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "minimum_role", "roles": "admin" }));
    }
}
