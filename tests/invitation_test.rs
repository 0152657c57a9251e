//! Invitation lifecycle tests: creation, the pending-uniqueness rule, lazy
//! expiry, and the cancel/resend authorization rule.

mod common;

use chrono::{Duration, Utc};
use uuid::Uuid;

use common::{principal_of, seed_tenant, seed_user, test_state, MemoryStore};
use submission_service::error::AppError;
use submission_service::models::{
    CreateInvitationRequest, DeadlineStrategy, Invitation, InvitationStatus, Role, Tenant,
};

#[tokio::test]
async fn create_yields_pending_invitation_with_expiry_window() {
    let store = MemoryStore::new();
    let tenant = seed_tenant(&store);
    let manager = seed_user(&store, tenant.tenant_id, Role::Manager);
    let state = test_state(store.clone());

    let before = Utc::now();
    let invitation = state
        .invitations
        .create(&principal_of(&manager), &invite("new.hire@example.com"))
        .await
        .unwrap();

    assert_eq!(invitation.status, InvitationStatus::Pending);
    assert_eq!(invitation.tenant_id, tenant.tenant_id);
    assert_eq!(invitation.invited_by, manager.user_id);
    // The configured window in the fixtures is seven days.
    assert!(invitation.expires_utc >= before + Duration::days(7));
    assert!(invitation.expires_utc <= Utc::now() + Duration::days(7));
}

#[tokio::test]
async fn second_pending_invitation_for_same_email_is_a_conflict() {
    let store = MemoryStore::new();
    let tenant = seed_tenant(&store);
    let manager = seed_user(&store, tenant.tenant_id, Role::Manager);
    let state = test_state(store.clone());
    let principal = principal_of(&manager);

    state
        .invitations
        .create(&principal, &invite("dup@example.com"))
        .await
        .unwrap();
    let err = state
        .invitations
        .create(&principal, &invite("dup@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::DuplicateInvitation));
}

#[tokio::test]
async fn terminal_invitation_does_not_block_a_new_one() {
    let store = MemoryStore::new();
    let tenant = seed_tenant(&store);
    let manager = seed_user(&store, tenant.tenant_id, Role::Manager);
    let state = test_state(store.clone());
    let principal = principal_of(&manager);

    let first = state
        .invitations
        .create(&principal, &invite("rehire@example.com"))
        .await
        .unwrap();
    state.invitations.decline(first.invitation_id).await.unwrap();

    state
        .invitations
        .create(&principal, &invite("rehire@example.com"))
        .await
        .unwrap();
}

#[tokio::test]
async fn same_email_in_another_tenant_is_not_a_conflict() {
    let store = MemoryStore::new();
    let tenant = seed_tenant(&store);
    let manager = seed_user(&store, tenant.tenant_id, Role::Manager);
    let other_tenant = Tenant::new("Other SA".to_string(), DeadlineStrategy::EndOfMonth);
    store.insert_tenant(other_tenant.clone());
    let other_manager = seed_user(&store, other_tenant.tenant_id, Role::Manager);
    let state = test_state(store.clone());

    state
        .invitations
        .create(&principal_of(&manager), &invite("shared@example.com"))
        .await
        .unwrap();
    state
        .invitations
        .create(&principal_of(&other_manager), &invite("shared@example.com"))
        .await
        .unwrap();
}

#[tokio::test]
async fn accept_stamps_timestamp_and_is_not_repeatable() {
    let store = MemoryStore::new();
    let tenant = seed_tenant(&store);
    let manager = seed_user(&store, tenant.tenant_id, Role::Manager);
    let state = test_state(store.clone());

    let invitation = state
        .invitations
        .create(&principal_of(&manager), &invite("joiner@example.com"))
        .await
        .unwrap();

    let accepted = state
        .invitations
        .accept(invitation.invitation_id)
        .await
        .unwrap();
    assert_eq!(accepted.status, InvitationStatus::Accepted);
    assert!(accepted.accepted_utc.is_some());
    assert!(accepted.declined_utc.is_none());

    let err = state
        .invitations
        .accept(invitation.invitation_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

#[tokio::test]
async fn decline_stamps_timestamp() {
    let store = MemoryStore::new();
    let tenant = seed_tenant(&store);
    let manager = seed_user(&store, tenant.tenant_id, Role::Manager);
    let state = test_state(store.clone());

    let invitation = state
        .invitations
        .create(&principal_of(&manager), &invite("no.thanks@example.com"))
        .await
        .unwrap();
    let declined = state
        .invitations
        .decline(invitation.invitation_id)
        .await
        .unwrap();

    assert_eq!(declined.status, InvitationStatus::Declined);
    assert!(declined.declined_utc.is_some());
    assert!(declined.accepted_utc.is_none());
}

#[tokio::test]
async fn accept_past_expiry_expires_the_record() {
    let store = MemoryStore::new();
    let tenant = seed_tenant(&store);
    let manager = seed_user(&store, tenant.tenant_id, Role::Manager);
    let state = test_state(store.clone());

    let stale = Invitation::new(
        tenant.tenant_id,
        "slow@example.com".to_string(),
        manager.user_id,
        Role::Collaborator,
        Utc::now() - Duration::days(1),
    );
    store.insert_invitation(stale.clone());

    let err = state
        .invitations
        .accept(stale.invitation_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvitationExpired));
    assert_eq!(
        store.invitation(stale.invitation_id).unwrap().status,
        InvitationStatus::Expired
    );
}

#[tokio::test]
async fn decline_past_expiry_expires_the_record() {
    let store = MemoryStore::new();
    let tenant = seed_tenant(&store);
    let manager = seed_user(&store, tenant.tenant_id, Role::Manager);
    let state = test_state(store.clone());

    let stale = Invitation::new(
        tenant.tenant_id,
        "too.late@example.com".to_string(),
        manager.user_id,
        Role::Collaborator,
        Utc::now() - Duration::hours(2),
    );
    store.insert_invitation(stale.clone());

    let err = state
        .invitations
        .decline(stale.invitation_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvitationExpired));
    assert_eq!(
        store.invitation(stale.invitation_id).unwrap().status,
        InvitationStatus::Expired
    );
}

#[tokio::test]
async fn cancel_is_limited_to_inviter_or_tenant_manager() {
    let store = MemoryStore::new();
    let tenant = seed_tenant(&store);
    let inviter = seed_user(&store, tenant.tenant_id, Role::Manager);
    let other_manager = seed_user(&store, tenant.tenant_id, Role::Manager);
    let collaborator = seed_user(&store, tenant.tenant_id, Role::Collaborator);
    let other_tenant = Tenant::new("Other SA".to_string(), DeadlineStrategy::EndOfMonth);
    store.insert_tenant(other_tenant.clone());
    let outsider = seed_user(&store, other_tenant.tenant_id, Role::Manager);
    let state = test_state(store.clone());

    let invitation = state
        .invitations
        .create(&principal_of(&inviter), &invite("target@example.com"))
        .await
        .unwrap();

    let err = state
        .invitations
        .cancel(&principal_of(&outsider), invitation.invitation_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccessDenied));

    let err = state
        .invitations
        .cancel(&principal_of(&collaborator), invitation.invitation_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccessDenied));

    // Any manager of the tenant may cancel, not just the inviter.
    let cancelled = state
        .invitations
        .cancel(&principal_of(&other_manager), invitation.invitation_id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, InvitationStatus::Cancelled);
}

#[tokio::test]
async fn cancel_by_the_inviter_succeeds() {
    let store = MemoryStore::new();
    let tenant = seed_tenant(&store);
    let inviter = seed_user(&store, tenant.tenant_id, Role::Manager);
    let state = test_state(store.clone());
    let principal = principal_of(&inviter);

    let invitation = state
        .invitations
        .create(&principal, &invite("undo@example.com"))
        .await
        .unwrap();
    let cancelled = state
        .invitations
        .cancel(&principal, invitation.invitation_id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, InvitationStatus::Cancelled);

    // A cancelled invitation cannot be accepted afterwards.
    let err = state
        .invitations
        .accept(invitation.invitation_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

#[tokio::test]
async fn resend_extends_the_expiry_window() {
    let store = MemoryStore::new();
    let tenant = seed_tenant(&store);
    let inviter = seed_user(&store, tenant.tenant_id, Role::Manager);
    let state = test_state(store.clone());
    let principal = principal_of(&inviter);

    let invitation = state
        .invitations
        .create(&principal, &invite("nudge@example.com"))
        .await
        .unwrap();
    let resent = state
        .invitations
        .resend(&principal, invitation.invitation_id)
        .await
        .unwrap();

    assert_eq!(resent.status, InvitationStatus::Pending);
    assert_eq!(
        resent.expires_utc,
        invitation.expires_utc + Duration::days(7)
    );
}

#[tokio::test]
async fn resend_cannot_revive_an_expired_invitation() {
    let store = MemoryStore::new();
    let tenant = seed_tenant(&store);
    let inviter = seed_user(&store, tenant.tenant_id, Role::Manager);
    let state = test_state(store.clone());

    let stale = Invitation::new(
        tenant.tenant_id,
        "gone@example.com".to_string(),
        inviter.user_id,
        Role::Collaborator,
        Utc::now() - Duration::days(3),
    );
    store.insert_invitation(stale.clone());

    let err = state
        .invitations
        .resend(&principal_of(&inviter), stale.invitation_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvitationExpired));
    assert_eq!(
        store.invitation(stale.invitation_id).unwrap().status,
        InvitationStatus::Expired
    );
}

#[tokio::test]
async fn unknown_invitation_is_not_found() {
    let store = MemoryStore::new();
    let tenant = seed_tenant(&store);
    let manager = seed_user(&store, tenant.tenant_id, Role::Manager);
    let state = test_state(store.clone());

    let err = state
        .invitations
        .cancel(&principal_of(&manager), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

fn invite(email: &str) -> CreateInvitationRequest {
    CreateInvitationRequest {
        email: email.to_string(),
        role: Role::Collaborator,
    }
}
