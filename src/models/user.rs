//! User model - tenant-scoped accounts and the per-request principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The two roles in the system. Managers administer their tenant;
/// collaborators submit invoices for review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    Manager,
    Collaborator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::Collaborator => "collaborator",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "manager" => Some(Role::Manager),
            "collaborator" => Some(Role::Collaborator),
            _ => None,
        }
    }
}

/// Account status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "account_status", rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Suspended,
    Pending,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Suspended => "suspended",
            AccountStatus::Pending => "pending",
        }
    }
}

/// User entity (tenant-scoped once onboarding is complete).
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    /// Null until the user has joined a tenant.
    pub tenant_id: Option<Uuid>,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub account_status: AccountStatus,
    pub created_utc: DateTime<Utc>,
}

impl User {
    pub fn new(tenant_id: Option<Uuid>, email: String, role: Role) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            tenant_id,
            email,
            display_name: None,
            role,
            account_status: AccountStatus::Active,
            created_utc: Utc::now(),
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.account_status == AccountStatus::Suspended
    }
}

/// The authenticated actor for one request. Derived from a verified
/// credential plus a live account read; never persisted.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
    pub tenant_id: Option<Uuid>,
    pub account_status: AccountStatus,
}

impl Principal {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.user_id,
            role: user.role,
            tenant_id: user.tenant_id,
            account_status: user.account_status,
        }
    }
}

/// User response for API (without internal fields).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub account_status: AccountStatus,
    pub created_utc: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            user_id: u.user_id,
            tenant_id: u.tenant_id,
            email: u.email,
            display_name: u.display_name,
            role: u.role,
            account_status: u.account_status,
            created_utc: u.created_utc,
        }
    }
}
