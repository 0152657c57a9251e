//! Persistence collaborator contract.
//!
//! The status-changing methods are conditional updates: they apply only when
//! the persisted status equals `expected_from` and return `None` otherwise.
//! Two concurrent transition attempts on the same record therefore race
//! safely; the loser observes a stale `from` and surfaces `InvalidTransition`
//! instead of corrupting state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    ActivityEvent, Invitation, InvitationPatch, InvitationStatus, Invoice, InvoicePatch,
    InvoiceStatus, Tenant, User,
};

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError>;

    async fn create_invoice(&self, invoice: &Invoice) -> Result<Invoice, AppError>;

    async fn find_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError>;

    async fn list_invoices_for_submitter(
        &self,
        tenant_id: Uuid,
        submitter_id: Uuid,
    ) -> Result<Vec<Invoice>, AppError>;

    /// Conditional status transition scoped to the tenant. `None` means the
    /// record was not in `expected_from` (or does not exist in this tenant);
    /// the record is unchanged in that case.
    async fn update_invoice_status(
        &self,
        tenant_id: Uuid,
        invoice_id: Uuid,
        expected_from: InvoiceStatus,
        to: InvoiceStatus,
        patch: &InvoicePatch,
    ) -> Result<Option<Invoice>, AppError>;

    /// Fails with `DuplicateInvitation` when a pending invitation already
    /// exists for the same (email, tenant) pair.
    async fn create_invitation(&self, invitation: &Invitation) -> Result<Invitation, AppError>;

    async fn find_invitation(&self, invitation_id: Uuid) -> Result<Option<Invitation>, AppError>;

    async fn find_pending_invitation(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> Result<Option<Invitation>, AppError>;

    /// Conditional status transition; same contract as the invoice variant.
    async fn update_invitation_status(
        &self,
        invitation_id: Uuid,
        expected_from: InvitationStatus,
        to: InvitationStatus,
        patch: &InvitationPatch,
    ) -> Result<Option<Invitation>, AppError>;

    /// Push `expires_utc` out without touching status. Applies only while
    /// the invitation is still pending.
    async fn extend_invitation_expiry(
        &self,
        invitation_id: Uuid,
        new_expiry: DateTime<Utc>,
    ) -> Result<Option<Invitation>, AppError>;

    async fn record_activity(&self, event: &ActivityEvent) -> Result<(), AppError>;
}
