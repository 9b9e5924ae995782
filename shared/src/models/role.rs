//! Caller identity
//!
//! Authentication happens upstream; the ledger only sees the resolved
//! user id and role.

use serde::{Deserialize, Serialize};

/// Role of the caller
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Authenticated caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::User,
        }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins may act on any order, users only on their own
    pub fn can_access(&self, owner_id: &str) -> bool {
        self.is_admin() || self.id == owner_id
    }
}
