//! Invitation model - tenant membership onboarding records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::Role;

/// Invitation status codes. Every status except `Pending` is terminal and
/// never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
    Cancelled,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Declined => "declined",
            InvitationStatus::Expired => "expired",
            InvitationStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, InvitationStatus::Pending)
    }
}

/// Invitation entity.
#[derive(Debug, Clone, FromRow)]
pub struct Invitation {
    pub invitation_id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub invited_by: Uuid,
    pub role: Role,
    pub status: InvitationStatus,
    pub expires_utc: DateTime<Utc>,
    pub accepted_utc: Option<DateTime<Utc>>,
    pub declined_utc: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
}

impl Invitation {
    pub fn new(
        tenant_id: Uuid,
        email: String,
        invited_by: Uuid,
        role: Role,
        expires_utc: DateTime<Utc>,
    ) -> Self {
        Self {
            invitation_id: Uuid::new_v4(),
            tenant_id,
            email,
            invited_by,
            role,
            status: InvitationStatus::Pending,
            expires_utc,
            accepted_utc: None,
            declined_utc: None,
            created_utc: Utc::now(),
        }
    }

    /// Whether the validity window has run out at `now`. Expiry is evaluated
    /// lazily on access; the status flips only when someone touches the
    /// record past this instant.
    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_utc
    }
}

/// Fields a lifecycle transition may set alongside the status change.
#[derive(Debug, Clone, Default)]
pub struct InvitationPatch {
    pub accepted_utc: Option<DateTime<Utc>>,
    pub declined_utc: Option<DateTime<Utc>>,
}

/// Request to invite a collaborator or manager into the tenant.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInvitationRequest {
    #[validate(email)]
    pub email: String,
    pub role: Role,
}

/// Invitation response for API.
#[derive(Debug, Clone, Serialize)]
pub struct InvitationResponse {
    pub invitation_id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub invited_by: Uuid,
    pub role: Role,
    pub status: InvitationStatus,
    pub expires_utc: DateTime<Utc>,
    pub accepted_utc: Option<DateTime<Utc>>,
    pub declined_utc: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
}

impl From<Invitation> for InvitationResponse {
    fn from(i: Invitation) -> Self {
        Self {
            invitation_id: i.invitation_id,
            tenant_id: i.tenant_id,
            email: i.email,
            invited_by: i.invited_by,
            role: i.role,
            status: i.status,
            expires_utc: i.expires_utc,
            accepted_utc: i.accepted_utc,
            declined_utc: i.declined_utc,
            created_utc: i.created_utc,
        }
    }
}
