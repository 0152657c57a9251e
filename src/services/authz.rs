//! Role and ownership authorization.
//!
//! Pure decision functions composed into the per-request chain:
//! identity → role → ownership. The chain short-circuits at the first denial
//! and each stage sees only the previous stage's pass/fail result, so the
//! three concerns stay independently testable.

use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Principal, Role};

/// Ownership rules for a resource-bearing endpoint.
///
/// `identity_param` names the path parameter carrying the target identity;
/// when the matched route has no such parameter the check collapses to
/// role-only.
#[derive(Debug, Clone)]
pub struct OwnershipPolicy {
    pub allow_self: bool,
    pub allow_tenant: bool,
    pub identity_param: &'static str,
}

impl OwnershipPolicy {
    pub fn self_only() -> Self {
        Self {
            allow_self: true,
            allow_tenant: false,
            identity_param: "id",
        }
    }

    pub fn self_or_tenant() -> Self {
        Self {
            allow_self: true,
            allow_tenant: true,
            identity_param: "id",
        }
    }

    pub fn with_param(mut self, name: &'static str) -> Self {
        self.identity_param = name;
        self
    }
}

/// Statically declared authorization requirements for one route. Passed to
/// the guard at router assembly; there is no registration-order magic.
#[derive(Debug, Clone, Default)]
pub struct RoutePolicy {
    /// Empty means the endpoint has no role restriction.
    pub allowed_roles: Vec<Role>,
    pub ownership: Option<OwnershipPolicy>,
}

impl RoutePolicy {
    /// Any authenticated principal.
    pub fn open() -> Self {
        Self::default()
    }

    pub fn roles(allowed: &[Role]) -> Self {
        Self {
            allowed_roles: allowed.to_vec(),
            ownership: None,
        }
    }

    pub fn with_ownership(mut self, ownership: OwnershipPolicy) -> Self {
        self.ownership = Some(ownership);
        self
    }
}

/// Role stage. An empty allowed set is an unrestricted endpoint.
pub fn check_role(principal: &Principal, allowed_roles: &[Role]) -> Result<(), AppError> {
    if allowed_roles.is_empty() || allowed_roles.contains(&principal.role) {
        Ok(())
    } else {
        Err(AppError::InsufficientRole)
    }
}

/// Ownership stage.
///
/// Collaborators are contained to their own records: the tenant-wide grant is
/// never consulted for them, so a misconfigured policy cannot over-grant.
/// Managers get tenant-wide access when the policy allows it, plus the self
/// match either way.
pub fn check_ownership(
    principal: &Principal,
    policy: &OwnershipPolicy,
    resource_id: Option<Uuid>,
) -> Result<(), AppError> {
    let resource_id = match resource_id {
        Some(id) => id,
        // No identity parameter on the call: role-only endpoint.
        None => return Ok(()),
    };

    let is_self = policy.allow_self && resource_id == principal.user_id;

    match principal.role {
        Role::Collaborator => {
            if is_self {
                Ok(())
            } else {
                Err(AppError::OwnershipRequired)
            }
        }
        Role::Manager => {
            if policy.allow_tenant || is_self {
                Ok(())
            } else {
                Err(AppError::AccessDenied)
            }
        }
    }
}

/// Role and ownership stages for an already-verified principal, in chain
/// order. Identity verification happens upstream (middleware::auth) before
/// this runs.
pub fn authorize(
    principal: &Principal,
    policy: &RoutePolicy,
    resource_id: Option<Uuid>,
) -> Result<(), AppError> {
    check_role(principal, &policy.allowed_roles)?;

    if let Some(ownership) = &policy.ownership {
        check_ownership(principal, ownership, resource_id)?;
    }

    Ok(())
}

/// Tenant containment for resource access inside business logic: a principal
/// may only touch records of the tenant it belongs to.
pub fn ensure_same_tenant(principal: &Principal, tenant_id: Uuid) -> Result<(), AppError> {
    if principal.tenant_id == Some(tenant_id) {
        Ok(())
    } else {
        Err(AppError::AccessDenied)
    }
}
