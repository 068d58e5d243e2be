//! Principals and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authorization role. Ordered: each role includes the powers of those below.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Reads the catalog, recommendations, jobs, and events.
    Viewer,
    /// Additionally creates migrations on their own objects.
    User,
    /// Additionally refreshes the catalog, cancels any job, and manages
    /// principals.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Whether this role includes the powers of `required`.
    pub fn allows(&self, required: Role) -> bool {
        *self >= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered identity. The credential exists only as a salted Argon2id
/// hash; the struct intentionally has no plaintext field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub role: Role,
    pub credential_hash: String,
    pub created_at: DateTime<Utc>,
}

/// The validated identity attached to a request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub principal_id: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Admin.allows(Role::User));
        assert!(Role::Admin.allows(Role::Viewer));
        assert!(Role::User.allows(Role::Viewer));
        assert!(!Role::Viewer.allows(Role::User));
        assert!(!Role::User.allows(Role::Admin));
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let role: Role = serde_json::from_str("\"viewer\"").unwrap();
        assert_eq!(role, Role::Viewer);
    }
}
