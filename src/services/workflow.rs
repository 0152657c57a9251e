//! Invoice review state machine.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    ActivityEvent, Invoice, InvoicePatch, InvoiceStatus, Principal, Role, SubmitInvoiceRequest,
};
use crate::services::{authz, deadline, metrics::TRANSITIONS_TOTAL, ActivityLog, SubmissionStore};

/// A review action against an invoice. The transition table below is the
/// single source of truth: adding a status or action forces every match here
/// to be revisited.
#[derive(Debug, Clone)]
pub enum InvoiceAction {
    Approve,
    Reject { reason: String },
    Ignore,
    MarkPaid,
}

impl InvoiceAction {
    pub fn name(&self) -> &'static str {
        match self {
            InvoiceAction::Approve => "approve",
            InvoiceAction::Reject { .. } => "reject",
            InvoiceAction::Ignore => "ignore",
            InvoiceAction::MarkPaid => "mark_paid",
        }
    }

    /// The status the record must currently hold.
    fn from_status(&self) -> InvoiceStatus {
        match self {
            InvoiceAction::Approve | InvoiceAction::Reject { .. } | InvoiceAction::Ignore => {
                InvoiceStatus::Submitted
            }
            InvoiceAction::MarkPaid => InvoiceStatus::Approved,
        }
    }

    /// The status the record moves to.
    fn to_status(&self) -> InvoiceStatus {
        match self {
            InvoiceAction::Approve => InvoiceStatus::Approved,
            InvoiceAction::Reject { .. } => InvoiceStatus::Rejected,
            InvoiceAction::Ignore => InvoiceStatus::Ignored,
            InvoiceAction::MarkPaid => InvoiceStatus::Paid,
        }
    }

    fn required_role(&self) -> Role {
        match self {
            InvoiceAction::Approve
            | InvoiceAction::Reject { .. }
            | InvoiceAction::Ignore
            | InvoiceAction::MarkPaid => Role::Manager,
        }
    }
}

/// Invoice lifecycle service: submission plus the manager review transitions.
#[derive(Clone)]
pub struct InvoiceWorkflow {
    store: Arc<dyn SubmissionStore>,
    activity: ActivityLog,
}

impl InvoiceWorkflow {
    pub fn new(store: Arc<dyn SubmissionStore>, activity: ActivityLog) -> Self {
        Self { store, activity }
    }

    /// Create an invoice in `Submitted` for a reference month. The tenant's
    /// deadline policy decides the immutable `is_late` annotation; lateness
    /// never affects transition legality.
    pub async fn submit(
        &self,
        principal: &Principal,
        request: &SubmitInvoiceRequest,
    ) -> Result<Invoice, AppError> {
        authz::check_role(principal, &[Role::Collaborator])?;

        let tenant_id = principal.tenant_id.ok_or(AppError::AccessDenied)?;
        let tenant = self
            .store
            .find_tenant(tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Tenant not found")))?;

        let deadline = deadline::deadline_for(
            &tenant.submission_policy(),
            request.ref_year,
            request.ref_month as u32,
        )?;

        let now = Utc::now();
        let is_late = now.date_naive() > deadline;

        let invoice = Invoice::new(
            tenant_id,
            principal.user_id,
            request.ref_year,
            request.ref_month,
            is_late,
            now,
        );
        let created = self.store.create_invoice(&invoice).await?;

        info!(
            invoice_id = %created.invoice_id,
            tenant_id = %tenant_id,
            ref_year = created.ref_year,
            ref_month = created.ref_month,
            is_late = created.is_late,
            "Invoice submitted"
        );
        TRANSITIONS_TOTAL
            .with_label_values(&["invoice", "submit"])
            .inc();

        self.activity.record(ActivityEvent::new(
            tenant_id,
            principal.user_id,
            "invoice.submitted",
            Some(
                json!({
                    "invoice_id": created.invoice_id,
                    "ref_year": created.ref_year,
                    "ref_month": created.ref_month,
                    "is_late": created.is_late,
                })
                .to_string(),
            ),
        ));

        Ok(created)
    }

    /// Apply a review transition.
    ///
    /// Order of checks: role (a collaborator always gets `InsufficientRole`
    /// regardless of state), input validation (empty rejection reason fails
    /// before any read or write), tenant containment (`AccessDenied` before
    /// the transition table is consulted), then the conditional update. A
    /// concurrent transition that got there first leaves the record out of
    /// the expected `from` status and this call reports `InvalidTransition`.
    pub async fn apply(
        &self,
        principal: &Principal,
        invoice_id: Uuid,
        action: InvoiceAction,
    ) -> Result<Invoice, AppError> {
        authz::check_role(principal, &[action.required_role()])?;

        let rejection_reason = match &action {
            InvoiceAction::Reject { reason } => {
                let trimmed = reason.trim();
                if trimmed.is_empty() {
                    return Err(AppError::MissingRejectionReason);
                }
                Some(trimmed.to_string())
            }
            _ => None,
        };

        let current = self
            .store
            .find_invoice(invoice_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;
        authz::ensure_same_tenant(principal, current.tenant_id)?;

        let now = Utc::now();
        let patch = match &action {
            InvoiceAction::Approve | InvoiceAction::Reject { .. } | InvoiceAction::Ignore => {
                InvoicePatch {
                    reviewer_id: Some(principal.user_id),
                    reviewed_utc: Some(now),
                    rejection_reason,
                    payment_date: None,
                }
            }
            InvoiceAction::MarkPaid => InvoicePatch {
                payment_date: Some(now.date_naive()),
                ..Default::default()
            },
        };

        let updated = self
            .store
            .update_invoice_status(
                current.tenant_id,
                invoice_id,
                action.from_status(),
                action.to_status(),
                &patch,
            )
            .await?
            .ok_or_else(|| {
                AppError::InvalidTransition(format!(
                    "{} is not legal from the invoice's current status",
                    action.name()
                ))
            })?;

        info!(
            invoice_id = %updated.invoice_id,
            tenant_id = %updated.tenant_id,
            action = action.name(),
            status = updated.status.as_str(),
            "Invoice transition applied"
        );
        TRANSITIONS_TOTAL
            .with_label_values(&["invoice", action.name()])
            .inc();

        self.activity.record(ActivityEvent::new(
            updated.tenant_id,
            principal.user_id,
            &format!("invoice.{}", action.name()),
            Some(json!({ "invoice_id": updated.invoice_id }).to_string()),
        ));

        Ok(updated)
    }

    /// Fetch one invoice under the ownership rules: collaborators see only
    /// their own records, managers anything in their tenant.
    pub async fn get(&self, principal: &Principal, invoice_id: Uuid) -> Result<Invoice, AppError> {
        let invoice = self
            .store
            .find_invoice(invoice_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

        match principal.role {
            Role::Collaborator => {
                if invoice.submitter_id != principal.user_id {
                    return Err(AppError::OwnershipRequired);
                }
            }
            Role::Manager => authz::ensure_same_tenant(principal, invoice.tenant_id)?,
        }

        Ok(invoice)
    }

    /// List a user's invoices within the caller's tenant. The route-level
    /// ownership policy has already decided whether the caller may target
    /// this user id.
    pub async fn list_for_user(
        &self,
        principal: &Principal,
        user_id: Uuid,
    ) -> Result<Vec<Invoice>, AppError> {
        let tenant_id = principal.tenant_id.ok_or(AppError::AccessDenied)?;
        self.store
            .list_invoices_for_submitter(tenant_id, user_id)
            .await
    }
}
