use core::str::FromStr;

use serde::{Deserialize, Serialize};

use farmlink_core::{DomainError, UserId};

/// Marketplace role chosen by a user at sign-up.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Lists produce lots and fulfils orders.
    Farmer,
    /// Browses lots and places orders.
    Restaurant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Farmer => "farmer",
            Role::Restaurant => "restaurant",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "farmer" => Ok(Role::Farmer),
            "restaurant" => Ok(Role::Restaurant),
            other => Err(DomainError::validation(format!("unknown role '{other}'"))),
        }
    }
}

/// An authenticated caller, as supplied by the identity provider.
///
/// Passed explicitly into every application operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn farmer(user_id: UserId) -> Self {
        Self::new(user_id, Role::Farmer)
    }

    pub fn restaurant(user_id: UserId) -> Self {
        Self::new(user_id, Role::Restaurant)
    }

    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }
}
