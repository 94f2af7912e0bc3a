use serde::{Deserialize, Serialize};

pub const ROLE_STANDARD: &str = "standard";
pub const ROLE_ADMIN: &str = "admin";

/// The two privilege levels a stored user can hold.
///
/// Roles are only ever read from storage; a `role` carried inside a token
/// payload is ignored by every check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Standard,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Standard => ROLE_STANDARD,
            Role::Admin => ROLE_ADMIN,
        }
    }

    /// Unknown values fall back to `Standard` so a corrupted row never grants access.
    pub fn parse(value: &str) -> Role {
        match value {
            ROLE_ADMIN => Role::Admin,
            _ => Role::Standard,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}
