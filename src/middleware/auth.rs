//! Identity verification: bearer credential → `Principal`.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::error::AppError;
use crate::models::Principal;
use crate::AppState;

/// Verify the bearer credential and resolve the live account.
///
/// The token's role/tenant snapshot is never trusted on its own: the account
/// is re-fetched from storage on every request so a suspension that happened
/// after the token was issued still rejects the caller.
pub async fn verify_identity(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Principal, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AppError::InvalidCredential)?;

    let claims = state
        .jwt
        .validate_access_token(token)
        .map_err(|_| AppError::InvalidCredential)?;

    let user = state
        .store
        .find_user(claims.sub)
        .await?
        .ok_or(AppError::AccountNotFound)?;

    // Absolute: a suspended account is rejected even with a valid token.
    if user.is_suspended() {
        return Err(AppError::AccountSuspended);
    }

    Ok(Principal::from_user(&user))
}

/// Extractor handing the guard-verified principal to handlers.
pub struct AuthPrincipal(pub Principal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthPrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = parts.extensions.get::<Principal>().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "Principal missing from request extensions"
            ))
        })?;

        Ok(AuthPrincipal(principal.clone()))
    }
}
