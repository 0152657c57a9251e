//! Invitation lifecycle: pending → accepted / declined / expired / cancelled.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::config::InvitationConfig;
use crate::error::AppError;
use crate::models::{
    ActivityEvent, CreateInvitationRequest, Invitation, InvitationPatch, InvitationStatus,
    Principal, Role,
};
use crate::services::{authz, metrics::TRANSITIONS_TOTAL, ActivityLog, SubmissionStore};

/// Onboarding invitations. All terminal states are monotone; expiry is
/// evaluated lazily on access, so no background sweeper exists.
#[derive(Clone)]
pub struct InvitationService {
    store: Arc<dyn SubmissionStore>,
    activity: ActivityLog,
    expiry_days: i64,
    resend_extension_days: i64,
}

impl InvitationService {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        activity: ActivityLog,
        config: &InvitationConfig,
    ) -> Self {
        Self {
            store,
            activity,
            expiry_days: config.expiry_days,
            resend_extension_days: config.resend_extension_days,
        }
    }

    /// Invite an email address into the caller's tenant. At most one pending
    /// invitation may exist per (email, tenant) pair.
    pub async fn create(
        &self,
        principal: &Principal,
        request: &CreateInvitationRequest,
    ) -> Result<Invitation, AppError> {
        let tenant_id = principal.tenant_id.ok_or(AppError::AccessDenied)?;

        if self
            .store
            .find_pending_invitation(tenant_id, &request.email)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateInvitation);
        }

        let invitation = Invitation::new(
            tenant_id,
            request.email.clone(),
            principal.user_id,
            request.role,
            Utc::now() + Duration::days(self.expiry_days),
        );
        // The partial unique index backs this up against a concurrent create.
        let created = self.store.create_invitation(&invitation).await?;

        info!(
            invitation_id = %created.invitation_id,
            tenant_id = %tenant_id,
            email = %created.email,
            "Invitation created"
        );
        self.activity.record(ActivityEvent::new(
            tenant_id,
            principal.user_id,
            "invitation.created",
            Some(json!({ "invitation_id": created.invitation_id, "email": created.email }).to_string()),
        ));

        Ok(created)
    }

    /// Accept a pending invitation. Past the expiry instant the attempt
    /// instead forces the record to `Expired` and reports `InvitationExpired`
    /// so the caller learns the new terminal state.
    pub async fn accept(&self, invitation_id: Uuid) -> Result<Invitation, AppError> {
        let invitation = self.load(invitation_id).await?;
        self.require_pending(&invitation, "accept")?;
        self.expire_if_past_due(&invitation).await?;

        let patch = InvitationPatch {
            accepted_utc: Some(Utc::now()),
            declined_utc: None,
        };
        let updated = self
            .transition(
                invitation_id,
                InvitationStatus::Accepted,
                &patch,
                "accept",
            )
            .await?;

        self.activity.record(ActivityEvent::new(
            updated.tenant_id,
            updated.invited_by,
            "invitation.accepted",
            Some(json!({ "invitation_id": updated.invitation_id }).to_string()),
        ));

        Ok(updated)
    }

    /// Decline a pending invitation. An invitation past its expiry cannot be
    /// declined; it is only observed as expired.
    pub async fn decline(&self, invitation_id: Uuid) -> Result<Invitation, AppError> {
        let invitation = self.load(invitation_id).await?;
        self.require_pending(&invitation, "decline")?;
        self.expire_if_past_due(&invitation).await?;

        let patch = InvitationPatch {
            accepted_utc: None,
            declined_utc: Some(Utc::now()),
        };
        let updated = self
            .transition(
                invitation_id,
                InvitationStatus::Declined,
                &patch,
                "decline",
            )
            .await?;

        self.activity.record(ActivityEvent::new(
            updated.tenant_id,
            updated.invited_by,
            "invitation.declined",
            Some(json!({ "invitation_id": updated.invitation_id }).to_string()),
        ));

        Ok(updated)
    }

    /// Cancel a pending invitation. Only the original inviter or a manager
    /// of the same tenant may cancel.
    pub async fn cancel(
        &self,
        principal: &Principal,
        invitation_id: Uuid,
    ) -> Result<Invitation, AppError> {
        let invitation = self.load(invitation_id).await?;
        self.require_inviter_or_manager(principal, &invitation)?;
        self.require_pending(&invitation, "cancel")?;

        let updated = self
            .transition(
                invitation_id,
                InvitationStatus::Cancelled,
                &InvitationPatch::default(),
                "cancel",
            )
            .await?;

        self.activity.record(ActivityEvent::new(
            updated.tenant_id,
            principal.user_id,
            "invitation.cancelled",
            Some(json!({ "invitation_id": updated.invitation_id }).to_string()),
        ));

        Ok(updated)
    }

    /// Resend a pending invitation: pushes `expires_utc` out by the
    /// configured window without changing status. An invitation already past
    /// its expiry cannot be revived; it is lazily expired instead.
    pub async fn resend(
        &self,
        principal: &Principal,
        invitation_id: Uuid,
    ) -> Result<Invitation, AppError> {
        let invitation = self.load(invitation_id).await?;
        self.require_inviter_or_manager(principal, &invitation)?;
        self.require_pending(&invitation, "resend")?;
        self.expire_if_past_due(&invitation).await?;

        let new_expiry = invitation.expires_utc + Duration::days(self.resend_extension_days);
        let updated = self
            .store
            .extend_invitation_expiry(invitation_id, new_expiry)
            .await?
            .ok_or_else(|| {
                AppError::InvalidTransition(
                    "resend is not legal from the invitation's current status".to_string(),
                )
            })?;

        info!(
            invitation_id = %updated.invitation_id,
            expires_utc = %updated.expires_utc,
            "Invitation resent"
        );
        self.activity.record(ActivityEvent::new(
            updated.tenant_id,
            principal.user_id,
            "invitation.resent",
            Some(json!({ "invitation_id": updated.invitation_id }).to_string()),
        ));

        Ok(updated)
    }

    pub async fn get(&self, invitation_id: Uuid) -> Result<Invitation, AppError> {
        self.load(invitation_id).await
    }

    async fn load(&self, invitation_id: Uuid) -> Result<Invitation, AppError> {
        self.store
            .find_invitation(invitation_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invitation not found")))
    }

    fn require_pending(&self, invitation: &Invitation, action: &str) -> Result<(), AppError> {
        if invitation.status != InvitationStatus::Pending {
            return Err(AppError::InvalidTransition(format!(
                "{} is not legal from status {}",
                action,
                invitation.status.as_str()
            )));
        }
        Ok(())
    }

    fn require_inviter_or_manager(
        &self,
        principal: &Principal,
        invitation: &Invitation,
    ) -> Result<(), AppError> {
        authz::ensure_same_tenant(principal, invitation.tenant_id)?;
        if principal.user_id == invitation.invited_by || principal.role == Role::Manager {
            Ok(())
        } else {
            Err(AppError::AccessDenied)
        }
    }

    /// Lazy expiry: when the validity window has run out, force the record
    /// into `Expired` and report it. Losing this forced transition to a
    /// concurrent call is fine; the record ends up expired either way.
    async fn expire_if_past_due(&self, invitation: &Invitation) -> Result<(), AppError> {
        if !invitation.is_past_expiry(Utc::now()) {
            return Ok(());
        }

        let forced = self
            .store
            .update_invitation_status(
                invitation.invitation_id,
                InvitationStatus::Pending,
                InvitationStatus::Expired,
                &InvitationPatch::default(),
            )
            .await?;

        if forced.is_some() {
            info!(
                invitation_id = %invitation.invitation_id,
                "Invitation lazily expired"
            );
            TRANSITIONS_TOTAL
                .with_label_values(&["invitation", "expire"])
                .inc();
        }

        Err(AppError::InvitationExpired)
    }

    async fn transition(
        &self,
        invitation_id: Uuid,
        to: InvitationStatus,
        patch: &InvitationPatch,
        action: &str,
    ) -> Result<Invitation, AppError> {
        let updated = self
            .store
            .update_invitation_status(invitation_id, InvitationStatus::Pending, to, patch)
            .await?
            .ok_or_else(|| {
                AppError::InvalidTransition(format!(
                    "{} is not legal from the invitation's current status",
                    action
                ))
            })?;

        info!(
            invitation_id = %updated.invitation_id,
            action = action,
            status = updated.status.as_str(),
            "Invitation transition applied"
        );
        TRANSITIONS_TOTAL
            .with_label_values(&["invitation", action])
            .inc();

        Ok(updated)
    }
}
