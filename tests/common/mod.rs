//! Shared test fixtures: an in-memory store implementing the persistence
//! collaborator contract, plus principals and app-state builders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use submission_service::config::{InvitationConfig, JwtConfig};
use submission_service::error::AppError;
use submission_service::models::{
    AccountStatus, ActivityEvent, DeadlineStrategy, Invitation, InvitationPatch, InvitationStatus,
    Invoice, InvoicePatch, InvoiceStatus, Principal, Role, Tenant, User,
};
use submission_service::services::{JwtService, SubmissionStore};
use submission_service::AppState;

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    tenants: HashMap<Uuid, Tenant>,
    invoices: HashMap<Uuid, Invoice>,
    invitations: HashMap<Uuid, Invitation>,
    activity: Vec<ActivityEvent>,
}

/// In-memory store honoring the conditional-update contract, so race and
/// idempotence tests exercise the same semantics as the SQL backend.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert_user(&self, user: User) {
        self.inner.lock().unwrap().users.insert(user.user_id, user);
    }

    pub fn insert_tenant(&self, tenant: Tenant) {
        self.inner
            .lock()
            .unwrap()
            .tenants
            .insert(tenant.tenant_id, tenant);
    }

    pub fn insert_invitation(&self, invitation: Invitation) {
        self.inner
            .lock()
            .unwrap()
            .invitations
            .insert(invitation.invitation_id, invitation);
    }

    pub fn set_account_status(&self, user_id: Uuid, status: AccountStatus) {
        if let Some(user) = self.inner.lock().unwrap().users.get_mut(&user_id) {
            user.account_status = status;
        }
    }

    pub fn invoice(&self, invoice_id: Uuid) -> Option<Invoice> {
        self.inner.lock().unwrap().invoices.get(&invoice_id).cloned()
    }

    pub fn invitation(&self, invitation_id: Uuid) -> Option<Invitation> {
        self.inner
            .lock()
            .unwrap()
            .invitations
            .get(&invitation_id)
            .cloned()
    }

    pub fn activity_actions(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .activity
            .iter()
            .map(|e| e.action.clone())
            .collect()
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.inner.lock().unwrap().users.get(&user_id).cloned())
    }

    async fn find_tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError> {
        Ok(self.inner.lock().unwrap().tenants.get(&tenant_id).cloned())
    }

    async fn create_invoice(&self, invoice: &Invoice) -> Result<Invoice, AppError> {
        self.inner
            .lock()
            .unwrap()
            .invoices
            .insert(invoice.invoice_id, invoice.clone());
        Ok(invoice.clone())
    }

    async fn find_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        Ok(self.inner.lock().unwrap().invoices.get(&invoice_id).cloned())
    }

    async fn list_invoices_for_submitter(
        &self,
        tenant_id: Uuid,
        submitter_id: Uuid,
    ) -> Result<Vec<Invoice>, AppError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .invoices
            .values()
            .filter(|i| i.tenant_id == tenant_id && i.submitter_id == submitter_id)
            .cloned()
            .collect())
    }

    async fn update_invoice_status(
        &self,
        tenant_id: Uuid,
        invoice_id: Uuid,
        expected_from: InvoiceStatus,
        to: InvoiceStatus,
        patch: &InvoicePatch,
    ) -> Result<Option<Invoice>, AppError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.invoices.get_mut(&invoice_id) {
            Some(invoice)
                if invoice.tenant_id == tenant_id && invoice.status == expected_from =>
            {
                invoice.status = to;
                if patch.reviewer_id.is_some() {
                    invoice.reviewer_id = patch.reviewer_id;
                }
                if patch.reviewed_utc.is_some() {
                    invoice.reviewed_utc = patch.reviewed_utc;
                }
                if patch.rejection_reason.is_some() {
                    invoice.rejection_reason = patch.rejection_reason.clone();
                }
                if patch.payment_date.is_some() {
                    invoice.payment_date = patch.payment_date;
                }
                Ok(Some(invoice.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn create_invitation(&self, invitation: &Invitation) -> Result<Invitation, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let duplicate = inner.invitations.values().any(|i| {
            i.tenant_id == invitation.tenant_id
                && i.email == invitation.email
                && i.status == InvitationStatus::Pending
        });
        if duplicate {
            return Err(AppError::DuplicateInvitation);
        }
        inner
            .invitations
            .insert(invitation.invitation_id, invitation.clone());
        Ok(invitation.clone())
    }

    async fn find_invitation(&self, invitation_id: Uuid) -> Result<Option<Invitation>, AppError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .invitations
            .get(&invitation_id)
            .cloned())
    }

    async fn find_pending_invitation(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> Result<Option<Invitation>, AppError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .invitations
            .values()
            .find(|i| {
                i.tenant_id == tenant_id
                    && i.email == email
                    && i.status == InvitationStatus::Pending
            })
            .cloned())
    }

    async fn update_invitation_status(
        &self,
        invitation_id: Uuid,
        expected_from: InvitationStatus,
        to: InvitationStatus,
        patch: &InvitationPatch,
    ) -> Result<Option<Invitation>, AppError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.invitations.get_mut(&invitation_id) {
            Some(invitation) if invitation.status == expected_from => {
                invitation.status = to;
                if patch.accepted_utc.is_some() {
                    invitation.accepted_utc = patch.accepted_utc;
                }
                if patch.declined_utc.is_some() {
                    invitation.declined_utc = patch.declined_utc;
                }
                Ok(Some(invitation.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn extend_invitation_expiry(
        &self,
        invitation_id: Uuid,
        new_expiry: DateTime<Utc>,
    ) -> Result<Option<Invitation>, AppError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.invitations.get_mut(&invitation_id) {
            Some(invitation) if invitation.status == InvitationStatus::Pending => {
                invitation.expires_utc = new_expiry;
                Ok(Some(invitation.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn record_activity(&self, event: &ActivityEvent) -> Result<(), AppError> {
        self.inner.lock().unwrap().activity.push(event.clone());
        Ok(())
    }
}

/// A tenant with an end-of-month deadline (offset 0), the least surprising
/// default for tests that do not exercise lateness.
pub fn seed_tenant(store: &MemoryStore) -> Tenant {
    let mut tenant = Tenant::new("Acme GmbH".to_string(), DeadlineStrategy::EndOfMonth);
    tenant.offset_from_end = Some(0);
    store.insert_tenant(tenant.clone());
    tenant
}

pub fn seed_user(store: &MemoryStore, tenant_id: Uuid, role: Role) -> User {
    let email = format!("{}@example.com", Uuid::new_v4());
    let user = User::new(Some(tenant_id), email, role);
    store.insert_user(user.clone());
    user
}

pub fn principal_of(user: &User) -> Principal {
    Principal::from_user(user)
}

pub fn test_state(store: Arc<MemoryStore>) -> AppState {
    let jwt = JwtService::new(&JwtConfig {
        secret: "test-secret".to_string(),
        access_token_expiry_minutes: 15,
    });
    let invitation_config = InvitationConfig {
        expiry_days: 7,
        resend_extension_days: 7,
    };
    AppState::new(store, jwt, &invitation_config)
}

pub fn bearer(state: &AppState, user: &User) -> String {
    format!(
        "Bearer {}",
        state
            .jwt
            .generate_access_token(user)
            .expect("Failed to issue test token")
    )
}
