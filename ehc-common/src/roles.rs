//! Access roles
//!
//! Roles are not carried in member data. They are resolved from the
//! `admin_users` and `staff_users` tables at the time they are needed.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::fmt;
use std::str::FromStr;

use crate::Result;

/// Access level, ordered from least to most privileged
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Staff,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }

    /// Role to store when `looked_up` meets an already-stored role
    ///
    /// Elevated roles are sticky: the result is never lower than `existing`.
    pub fn merge(existing: Option<Role>, looked_up: Role) -> Role {
        match existing {
            Some(existing) => existing.max(looked_up),
            None => looked_up,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "member" => Ok(Role::Member),
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            other => Err(crate::Error::InvalidInput(format!("Unknown role: {}", other))),
        }
    }
}

/// Resolve the effective role for an email address
///
/// An active `admin_users` entry wins over an active `staff_users` entry;
/// everyone else is a member. Comparison is case-insensitive.
pub async fn lookup_role(pool: &SqlitePool, email: &str) -> Result<Role> {
    let email = email.trim().to_lowercase();

    let is_admin: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM admin_users WHERE LOWER(email) = ? AND is_active = 1)",
    )
    .bind(&email)
    .fetch_one(pool)
    .await?;
    if is_admin {
        return Ok(Role::Admin);
    }

    let is_staff: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM staff_users WHERE LOWER(email) = ? AND is_active = 1)",
    )
    .bind(&email)
    .fetch_one(pool)
    .await?;
    if is_staff {
        return Ok(Role::Staff);
    }

    Ok(Role::Member)
}
