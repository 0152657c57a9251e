//! Invitation handlers.
//!
//! Accept and decline are unauthenticated: the invitee does not have an
//! account yet. Everything else goes through the authorization chain.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::middleware::AuthPrincipal;
use crate::models::{CreateInvitationRequest, InvitationResponse};
use crate::AppState;

pub async fn create_invitation(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(request): Json<CreateInvitationRequest>,
) -> Result<(StatusCode, Json<InvitationResponse>), AppError> {
    request.validate()?;
    let invitation = state.invitations.create(&principal, &request).await?;
    Ok((StatusCode::CREATED, Json(invitation.into())))
}

pub async fn accept_invitation(
    State(state): State<AppState>,
    Path(invitation_id): Path<Uuid>,
) -> Result<Json<InvitationResponse>, AppError> {
    let invitation = state.invitations.accept(invitation_id).await?;
    Ok(Json(invitation.into()))
}

pub async fn decline_invitation(
    State(state): State<AppState>,
    Path(invitation_id): Path<Uuid>,
) -> Result<Json<InvitationResponse>, AppError> {
    let invitation = state.invitations.decline(invitation_id).await?;
    Ok(Json(invitation.into()))
}

pub async fn cancel_invitation(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(invitation_id): Path<Uuid>,
) -> Result<Json<InvitationResponse>, AppError> {
    let invitation = state.invitations.cancel(&principal, invitation_id).await?;
    Ok(Json(invitation.into()))
}

pub async fn resend_invitation(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(invitation_id): Path<Uuid>,
) -> Result<Json<InvitationResponse>, AppError> {
    let invitation = state.invitations.resend(&principal, invitation_id).await?;
    Ok(Json(invitation.into()))
}
