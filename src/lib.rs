pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod services;
pub mod startup;

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::InvitationConfig;
use crate::handlers::{health, invitations, invoices};
use crate::middleware::with_policy;
use crate::models::Role;
use crate::services::authz::{OwnershipPolicy, RoutePolicy};
use crate::services::{ActivityLog, InvitationService, InvoiceWorkflow, JwtService, SubmissionStore};

/// Shared application state. The store is held behind the persistence
/// collaborator trait so the services and the HTTP surface never depend on
/// the concrete backend.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SubmissionStore>,
    pub jwt: JwtService,
    pub workflow: InvoiceWorkflow,
    pub invitations: InvitationService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        jwt: JwtService,
        invitation_config: &InvitationConfig,
    ) -> Self {
        let activity = ActivityLog::new(store.clone());
        let workflow = InvoiceWorkflow::new(store.clone(), activity.clone());
        let invitations = InvitationService::new(store.clone(), activity, invitation_config);

        Self {
            store,
            jwt,
            workflow,
            invitations,
        }
    }
}

/// Assemble the router. Authorization requirements are plain `RoutePolicy`
/// values declared here, next to the routes they protect.
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let manager = RoutePolicy::roles(&[Role::Manager]);
    let collaborator = RoutePolicy::roles(&[Role::Collaborator]);
    let member = RoutePolicy::open();
    let own_records = RoutePolicy::open().with_ownership(OwnershipPolicy::self_or_tenant());

    let manager_routes = Router::new()
        .route("/invoices/:id/approve", post(invoices::approve_invoice))
        .route("/invoices/:id/reject", post(invoices::reject_invoice))
        .route("/invoices/:id/ignore", post(invoices::ignore_invoice))
        .route("/invoices/:id/pay", post(invoices::pay_invoice))
        .route("/invitations", post(invitations::create_invitation))
        .route_layer(from_fn_with_state(state.clone(), with_policy(manager)));

    let collaborator_routes = Router::new()
        .route("/invoices", post(invoices::submit_invoice))
        .route_layer(from_fn_with_state(state.clone(), with_policy(collaborator)));

    let member_routes = Router::new()
        .route("/invoices/:id", get(invoices::get_invoice))
        .route("/invitations/:id/cancel", post(invitations::cancel_invitation))
        .route("/invitations/:id/resend", post(invitations::resend_invitation))
        .route_layer(from_fn_with_state(state.clone(), with_policy(member)));

    let ownership_routes = Router::new()
        .route("/users/:id/invoices", get(invoices::list_user_invoices))
        .route_layer(from_fn_with_state(state.clone(), with_policy(own_records)));

    // Invitee-facing endpoints: no account exists yet, so no bearer token.
    let public_routes = Router::new()
        .route("/invitations/:id/accept", post(invitations::accept_invitation))
        .route("/invitations/:id/decline", post(invitations::decline_invitation))
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics));

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(manager_routes)
        .merge(collaborator_routes)
        .merge(member_routes)
        .merge(ownership_routes)
        .merge(public_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
