//! Database service for submission-service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    ActivityEvent, Invitation, InvitationPatch, InvitationStatus, Invoice, InvoicePatch,
    InvoiceStatus, Tenant, User,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::SubmissionStore;

const INVOICE_COLUMNS: &str = "invoice_id, tenant_id, submitter_id, ref_year, ref_month, status, \
     is_late, submitted_utc, reviewer_id, reviewed_utc, rejection_reason, payment_date, \
     reminder_count, created_utc";

const INVITATION_COLUMNS: &str = "invitation_id, tenant_id, email, invited_by, role, status, \
     expires_utc, accepted_utc, declined_utc, created_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "submission-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl SubmissionStore for Database {
    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_user"])
            .start_timer();

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, tenant_id, email, display_name, role, account_status, created_utc
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to find user: {}", e)))?;

        timer.observe_duration();

        Ok(user)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    async fn find_tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_tenant"])
            .start_timer();

        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT tenant_id, tenant_name, deadline_strategy, deadline_day, offset_from_start,
                   offset_from_end, reminder_first_day, reminder_second_day, created_utc
            FROM tenants
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to find tenant: {}", e)))?;

        timer.observe_duration();

        Ok(tenant)
    }

    #[instrument(skip(self, invoice), fields(tenant_id = %invoice.tenant_id))]
    async fn create_invoice(&self, invoice: &Invoice) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();

        let created = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            INSERT INTO invoices (invoice_id, tenant_id, submitter_id, ref_year, ref_month,
                                  status, is_late, submitted_utc, reminder_count, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(invoice.invoice_id)
        .bind(invoice.tenant_id)
        .bind(invoice.submitter_id)
        .bind(invoice.ref_year)
        .bind(invoice.ref_month)
        .bind(invoice.status)
        .bind(invoice.is_late)
        .bind(invoice.submitted_utc)
        .bind(invoice.reminder_count)
        .bind(invoice.created_utc)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to create invoice: {}", e)))?;

        timer.observe_duration();

        info!(invoice_id = %created.invoice_id, "Invoice created");

        Ok(created)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn find_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM invoices WHERE invoice_id = $1",
            INVOICE_COLUMNS
        ))
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to find invoice: {}", e)))?;

        timer.observe_duration();

        Ok(invoice)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, submitter_id = %submitter_id))]
    async fn list_invoices_for_submitter(
        &self,
        tenant_id: Uuid,
        submitter_id: Uuid,
    ) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices_for_submitter"])
            .start_timer();

        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            SELECT {}
            FROM invoices
            WHERE tenant_id = $1 AND submitter_id = $2
            ORDER BY ref_year DESC, ref_month DESC, created_utc DESC
            "#,
            INVOICE_COLUMNS
        ))
        .bind(tenant_id)
        .bind(submitter_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();

        Ok(invoices)
    }

    /// Single conditional update: the status change and its side-effect
    /// fields apply only when the persisted status still equals
    /// `expected_from`. The race loser gets `None` and an unchanged record.
    #[instrument(skip(self, patch), fields(tenant_id = %tenant_id, invoice_id = %invoice_id))]
    async fn update_invoice_status(
        &self,
        tenant_id: Uuid,
        invoice_id: Uuid,
        expected_from: InvoiceStatus,
        to: InvoiceStatus,
        patch: &InvoicePatch,
    ) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice_status"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            UPDATE invoices
            SET status = $4,
                reviewer_id = COALESCE($5, reviewer_id),
                reviewed_utc = COALESCE($6, reviewed_utc),
                rejection_reason = COALESCE($7, rejection_reason),
                payment_date = COALESCE($8, payment_date)
            WHERE tenant_id = $1 AND invoice_id = $2 AND status = $3
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(tenant_id)
        .bind(invoice_id)
        .bind(expected_from)
        .bind(to)
        .bind(patch.reviewer_id)
        .bind(patch.reviewed_utc)
        .bind(patch.rejection_reason.as_deref())
        .bind(patch.payment_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to update invoice: {}", e)))?;

        timer.observe_duration();

        if let Some(ref inv) = invoice {
            info!(invoice_id = %inv.invoice_id, status = inv.status.as_str(), "Invoice status updated");
        }

        Ok(invoice)
    }

    #[instrument(skip(self, invitation), fields(tenant_id = %invitation.tenant_id))]
    async fn create_invitation(&self, invitation: &Invitation) -> Result<Invitation, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invitation"])
            .start_timer();

        let created = sqlx::query_as::<_, Invitation>(&format!(
            r#"
            INSERT INTO invitations (invitation_id, tenant_id, email, invited_by, role,
                                     status, expires_utc, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            INVITATION_COLUMNS
        ))
        .bind(invitation.invitation_id)
        .bind(invitation.tenant_id)
        .bind(&invitation.email)
        .bind(invitation.invited_by)
        .bind(invitation.role)
        .bind(invitation.status)
        .bind(invitation.expires_utc)
        .bind(invitation.created_utc)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::DuplicateInvitation
            }
            _ => AppError::Database(anyhow::anyhow!("Failed to create invitation: {}", e)),
        })?;

        timer.observe_duration();

        info!(invitation_id = %created.invitation_id, "Invitation created");

        Ok(created)
    }

    #[instrument(skip(self), fields(invitation_id = %invitation_id))]
    async fn find_invitation(&self, invitation_id: Uuid) -> Result<Option<Invitation>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_invitation"])
            .start_timer();

        let invitation = sqlx::query_as::<_, Invitation>(&format!(
            "SELECT {} FROM invitations WHERE invitation_id = $1",
            INVITATION_COLUMNS
        ))
        .bind(invitation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to find invitation: {}", e)))?;

        timer.observe_duration();

        Ok(invitation)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    async fn find_pending_invitation(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> Result<Option<Invitation>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_pending_invitation"])
            .start_timer();

        let invitation = sqlx::query_as::<_, Invitation>(&format!(
            r#"
            SELECT {}
            FROM invitations
            WHERE tenant_id = $1 AND email = $2 AND status = 'pending'
            "#,
            INVITATION_COLUMNS
        ))
        .bind(tenant_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::Database(anyhow::anyhow!("Failed to find pending invitation: {}", e))
        })?;

        timer.observe_duration();

        Ok(invitation)
    }

    #[instrument(skip(self, patch), fields(invitation_id = %invitation_id))]
    async fn update_invitation_status(
        &self,
        invitation_id: Uuid,
        expected_from: InvitationStatus,
        to: InvitationStatus,
        patch: &InvitationPatch,
    ) -> Result<Option<Invitation>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invitation_status"])
            .start_timer();

        let invitation = sqlx::query_as::<_, Invitation>(&format!(
            r#"
            UPDATE invitations
            SET status = $3,
                accepted_utc = COALESCE($4, accepted_utc),
                declined_utc = COALESCE($5, declined_utc)
            WHERE invitation_id = $1 AND status = $2
            RETURNING {}
            "#,
            INVITATION_COLUMNS
        ))
        .bind(invitation_id)
        .bind(expected_from)
        .bind(to)
        .bind(patch.accepted_utc)
        .bind(patch.declined_utc)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to update invitation: {}", e)))?;

        timer.observe_duration();

        if let Some(ref inv) = invitation {
            info!(invitation_id = %inv.invitation_id, status = inv.status.as_str(), "Invitation status updated");
        }

        Ok(invitation)
    }

    #[instrument(skip(self), fields(invitation_id = %invitation_id))]
    async fn extend_invitation_expiry(
        &self,
        invitation_id: Uuid,
        new_expiry: DateTime<Utc>,
    ) -> Result<Option<Invitation>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["extend_invitation_expiry"])
            .start_timer();

        let invitation = sqlx::query_as::<_, Invitation>(&format!(
            r#"
            UPDATE invitations
            SET expires_utc = $2
            WHERE invitation_id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            INVITATION_COLUMNS
        ))
        .bind(invitation_id)
        .bind(new_expiry)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::Database(anyhow::anyhow!("Failed to extend invitation expiry: {}", e))
        })?;

        timer.observe_duration();

        Ok(invitation)
    }

    #[instrument(skip(self, event), fields(tenant_id = %event.tenant_id, action = %event.action))]
    async fn record_activity(&self, event: &ActivityEvent) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["record_activity"])
            .start_timer();

        sqlx::query(
            r#"
            INSERT INTO activity_log (tenant_id, actor_id, action, occurred_utc, details)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(event.tenant_id)
        .bind(event.actor_id)
        .bind(&event.action)
        .bind(event.occurred_utc)
        .bind(event.details.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to record activity: {}", e)))?;

        timer.observe_duration();

        Ok(())
    }
}
