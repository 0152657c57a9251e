//! Invoice model and review status codes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Invoice review status. `Submitted` is the only state with outgoing review
/// transitions; a rejected invoice is resubmitted as a new record, never by
/// reviving this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "invoice_status", rename_all = "lowercase")]
pub enum InvoiceStatus {
    Submitted,
    Approved,
    Rejected,
    Ignored,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Submitted => "submitted",
            InvoiceStatus::Approved => "approved",
            InvoiceStatus::Rejected => "rejected",
            InvoiceStatus::Ignored => "ignored",
            InvoiceStatus::Paid => "paid",
        }
    }

    /// A terminal status has no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        match self {
            InvoiceStatus::Submitted | InvoiceStatus::Approved => false,
            InvoiceStatus::Rejected | InvoiceStatus::Ignored | InvoiceStatus::Paid => true,
        }
    }
}

/// Invoice entity. `is_late` is stamped once at submission and never changes;
/// reviewer fields are set exactly when a manager has reviewed the record.
#[derive(Debug, Clone, FromRow)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub tenant_id: Uuid,
    pub submitter_id: Uuid,
    pub ref_year: i32,
    pub ref_month: i32,
    pub status: InvoiceStatus,
    pub is_late: bool,
    pub submitted_utc: DateTime<Utc>,
    pub reviewer_id: Option<Uuid>,
    pub reviewed_utc: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub reminder_count: i32,
    pub created_utc: DateTime<Utc>,
}

impl Invoice {
    pub fn new(
        tenant_id: Uuid,
        submitter_id: Uuid,
        ref_year: i32,
        ref_month: i32,
        is_late: bool,
        submitted_utc: DateTime<Utc>,
    ) -> Self {
        Self {
            invoice_id: Uuid::new_v4(),
            tenant_id,
            submitter_id,
            ref_year,
            ref_month,
            status: InvoiceStatus::Submitted,
            is_late,
            submitted_utc,
            reviewer_id: None,
            reviewed_utc: None,
            rejection_reason: None,
            payment_date: None,
            reminder_count: 0,
            created_utc: submitted_utc,
        }
    }
}

/// Fields a transition may set alongside the status change. Applied as a
/// single conditional update together with the expected `from` status.
#[derive(Debug, Clone, Default)]
pub struct InvoicePatch {
    pub reviewer_id: Option<Uuid>,
    pub reviewed_utc: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub payment_date: Option<NaiveDate>,
}

/// Request to submit an invoice for a reference month.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitInvoiceRequest {
    #[validate(range(min = 2000, max = 2100))]
    pub ref_year: i32,
    #[validate(range(min = 1, max = 12))]
    pub ref_month: i32,
}

/// Invoice response for API.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceResponse {
    pub invoice_id: Uuid,
    pub tenant_id: Uuid,
    pub submitter_id: Uuid,
    pub ref_year: i32,
    pub ref_month: i32,
    pub status: InvoiceStatus,
    pub is_late: bool,
    pub submitted_utc: DateTime<Utc>,
    pub reviewer_id: Option<Uuid>,
    pub reviewed_utc: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub reminder_count: i32,
}

impl From<Invoice> for InvoiceResponse {
    fn from(i: Invoice) -> Self {
        Self {
            invoice_id: i.invoice_id,
            tenant_id: i.tenant_id,
            submitter_id: i.submitter_id,
            ref_year: i.ref_year,
            ref_month: i.ref_month,
            status: i.status,
            is_late: i.is_late,
            submitted_utc: i.submitted_utc,
            reviewer_id: i.reviewer_id,
            reviewed_utc: i.reviewed_utc,
            rejection_reason: i.rejection_reason,
            payment_date: i.payment_date,
            reminder_count: i.reminder_count,
        }
    }
}
