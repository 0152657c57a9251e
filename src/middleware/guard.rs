//! Authorization chain middleware.
//!
//! One guard per route, parameterized by a statically declared `RoutePolicy`.
//! The stages run strictly in order - identity, role, ownership - and the
//! first denial is final; later stages assume the invariants the earlier
//! ones established (the ownership stage only ever sees an active account).

use std::future::Future;
use std::pin::Pin;

use axum::{
    extract::{RawPathParams, Request, State},
    middleware::Next,
    response::Response,
    RequestExt,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::verify_identity;
use crate::services::authz::{self, RoutePolicy};
use crate::services::metrics::AUTH_DENIALS_TOTAL;
use crate::AppState;

/// Run the full chain for one request, then hand the resolved principal to
/// the handler via request extensions.
pub async fn guard_request(
    state: AppState,
    policy: RoutePolicy,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = verify_identity(&state, req.headers()).await.map_err(|e| {
        AUTH_DENIALS_TOTAL.with_label_values(&["identity"]).inc();
        e
    })?;

    authz::check_role(&principal, &policy.allowed_roles).map_err(|e| {
        AUTH_DENIALS_TOTAL.with_label_values(&["role"]).inc();
        tracing::warn!(
            user_id = %principal.user_id,
            role = principal.role.as_str(),
            path = %req.uri().path(),
            "Role check denied"
        );
        e
    })?;

    if let Some(ownership) = &policy.ownership {
        let resource_id = resource_param(&mut req, ownership.identity_param).await?;
        authz::check_ownership(&principal, ownership, resource_id).map_err(|e| {
            AUTH_DENIALS_TOTAL.with_label_values(&["ownership"]).inc();
            tracing::warn!(
                user_id = %principal.user_id,
                resource_id = ?resource_id,
                path = %req.uri().path(),
                "Ownership check denied"
            );
            e
        })?;
    }

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// Wrap `guard_request` with a fixed policy for `middleware::from_fn_with_state`.
pub fn with_policy(
    policy: RoutePolicy,
) -> impl Fn(
    State<AppState>,
    Request,
    Next,
) -> Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>
       + Clone {
    move |State(state), req, next| {
        let policy = policy.clone();
        Box::pin(async move { guard_request(state, policy, req, next).await })
    }
}

/// Pull the target identity out of the matched route's path parameters.
/// A route without the named parameter collapses to role-only checking.
async fn resource_param(req: &mut Request, name: &str) -> Result<Option<Uuid>, AppError> {
    let params = match req.extract_parts::<RawPathParams>().await {
        Ok(params) => params,
        Err(_) => return Ok(None),
    };

    for (key, value) in params.iter() {
        if key == name {
            let id = Uuid::parse_str(value).map_err(|_| {
                AppError::BadRequest(anyhow::anyhow!("Invalid identifier in path: {}", value))
            })?;
            return Ok(Some(id));
        }
    }

    Ok(None)
}
