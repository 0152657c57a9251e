//! Invoice handlers: submission and the manager review actions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::middleware::AuthPrincipal;
use crate::models::{InvoiceResponse, SubmitInvoiceRequest};
use crate::services::InvoiceAction;
use crate::AppState;

pub async fn submit_invoice(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(request): Json<SubmitInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), AppError> {
    request.validate()?;
    let invoice = state.workflow.submit(&principal, &request).await?;
    Ok((StatusCode::CREATED, Json(invoice.into())))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state.workflow.get(&principal, invoice_id).await?;
    Ok(Json(invoice.into()))
}

pub async fn list_user_invoices(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<InvoiceResponse>>, AppError> {
    let invoices = state.workflow.list_for_user(&principal, user_id).await?;
    Ok(Json(invoices.into_iter().map(Into::into).collect()))
}

pub async fn approve_invoice(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state
        .workflow
        .apply(&principal, invoice_id, InvoiceAction::Approve)
        .await?;
    Ok(Json(invoice.into()))
}

#[derive(Debug, Deserialize)]
pub struct RejectInvoiceRequest {
    #[serde(default)]
    pub reason: String,
}

pub async fn reject_invoice(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(invoice_id): Path<Uuid>,
    Json(request): Json<RejectInvoiceRequest>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state
        .workflow
        .apply(
            &principal,
            invoice_id,
            InvoiceAction::Reject {
                reason: request.reason,
            },
        )
        .await?;
    Ok(Json(invoice.into()))
}

pub async fn ignore_invoice(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state
        .workflow
        .apply(&principal, invoice_id, InvoiceAction::Ignore)
        .await?;
    Ok(Json(invoice.into()))
}

pub async fn pay_invoice(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state
        .workflow
        .apply(&principal, invoice_id, InvoiceAction::MarkPaid)
        .await?;
    Ok(Json(invoice.into()))
}
