use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

/// Role
///
/// The closed set of roles a principal can hold. The declaration order is the
/// privilege order used by minimum-role policies:
/// `Student < Faculty < Admin < SuperAdmin`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Student,
    Faculty,
    Admin,
    SuperAdmin,
}

impl Role {
    /// Every role, lowest privilege first.
    pub const ALL: [Role; 4] = [Role::Student, Role::Faculty, Role::Admin, Role::SuperAdmin];

    /// The canonical token stored in `profiles.role` and sent over the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Faculty => "faculty",
            Role::Admin => "admin",
            Role::SuperAdmin => "superadmin",
        }
    }

    /// Roles a user may pick for themselves at registration.
    pub fn is_self_assignable(self) -> bool {
        matches!(self, Role::Student | Role::Faculty)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = InvalidRole;

    /// Case-insensitive. `super_admin` and `super-admin` are accepted spellings
    /// of `superadmin`; nothing else is guessed.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "faculty" => Ok(Role::Faculty),
            "admin" => Ok(Role::Admin),
            "superadmin" | "super_admin" | "super-admin" => Ok(Role::SuperAdmin),
            _ => Err(InvalidRole::Unknown(token.to_string())),
        }
    }
}

/// InvalidRole
///
/// A role value that could not be normalized. Callers of the access gate never
/// see this as an error; it always resolves to a denial.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRole {
    #[error("unrecognized role token `{0}`")]
    Unknown(String),
    #[error("role has an unsupported shape: {0}")]
    Shape(String),
}

/// RoleSource
///
/// A role as it arrives at the system boundary. Session payloads and admin
/// forms carry either a raw token (`"Admin"`) or a relation object
/// (`{"name": "Admin"}`). Anything else deserializes into `Unrecognized`
/// instead of failing, so the decision to deny stays with the gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleSource {
    Token(String),
    Relation { name: String },
    Unrecognized(serde_json::Value),
}

impl RoleSource {
    pub fn normalize(&self) -> Result<Role, InvalidRole> {
        normalize_role(self)
    }
}

impl From<Role> for RoleSource {
    fn from(role: Role) -> Self {
        RoleSource::Token(role.as_str().to_string())
    }
}

impl From<&str> for RoleSource {
    fn from(token: &str) -> Self {
        RoleSource::Token(token.to_string())
    }
}

/// Maps any boundary representation of a role onto the canonical `Role`.
pub fn normalize_role(source: &RoleSource) -> Result<Role, InvalidRole> {
    match source {
        RoleSource::Token(token) | RoleSource::Relation { name: token } => token.parse(),
        RoleSource::Unrecognized(value) => Err(InvalidRole::Shape(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ordering_follows_privilege() {
        assert!(Role::Student < Role::Faculty);
        assert!(Role::Faculty < Role::Admin);
        assert!(Role::Admin < Role::SuperAdmin);
    }

    #[test]
    fn tokens_parse_case_insensitively() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(" FACULTY ".parse::<Role>(), Ok(Role::Faculty));
        assert_eq!("super_admin".parse::<Role>(), Ok(Role::SuperAdmin));
        assert_eq!("SuperAdmin".parse::<Role>(), Ok(Role::SuperAdmin));
    }

    #[test]
    fn unknown_token_is_rejected() {
        assert_eq!(
            "Superuser".parse::<Role>(),
            Err(InvalidRole::Unknown("Superuser".to_string()))
        );
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn canonical_token_round_trips() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn string_and_relation_shapes_normalize_alike() {
        let token: RoleSource = serde_json::from_value(json!("Admin")).unwrap();
        let relation: RoleSource = serde_json::from_value(json!({ "name": "Admin" })).unwrap();

        assert_eq!(token.normalize(), Ok(Role::Admin));
        assert_eq!(relation.normalize(), Ok(Role::Admin));
    }

    #[test]
    fn relation_with_extra_fields_still_normalizes() {
        let relation: RoleSource =
            serde_json::from_value(json!({ "id": 3, "name": "faculty" })).unwrap();
        assert_eq!(relation.normalize(), Ok(Role::Faculty));
    }

    #[test]
    fn other_shapes_are_invalid() {
        for value in [json!(3), json!(["admin"]), json!({ "name": 7 }), json!(null)] {
            let source: RoleSource = serde_json::from_value(value).unwrap();
            assert!(matches!(source.normalize(), Err(InvalidRole::Shape(_))));
        }
    }
}
