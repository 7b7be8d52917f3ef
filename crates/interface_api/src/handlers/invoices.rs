//! Invoice handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{Actor, InvoiceId};
use domain_billing::{Invoice, InvoiceDetailsUpdate};

use crate::dto::billing::{CreateInvoiceRequest, ReplaceInvoiceLinesRequest, TaxOverrideRequest};
use crate::dto::{DeleteParams, ListParams};
use crate::{error::ApiError, AppState};

pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<Invoice>), ApiError> {
    request.validate()?;
    let invoice = state.invoices.create(&actor, request.into()).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Invoice>>, ApiError> {
    Ok(Json(state.invoices.list(params.customer(), params.query()).await?))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, ApiError> {
    Ok(Json(state.invoices.get(InvoiceId::from(id)).await?))
}

pub async fn replace_lines(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReplaceInvoiceLinesRequest>,
) -> Result<Json<Invoice>, ApiError> {
    let invoice = state
        .invoices
        .replace_lines(&actor, InvoiceId::from(id), request.lines, request.tax_total)
        .await?;
    Ok(Json(invoice))
}

pub async fn override_tax(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<TaxOverrideRequest>,
) -> Result<Json<Invoice>, ApiError> {
    let invoice = state
        .invoices
        .override_tax_total(&actor, InvoiceId::from(id), request.tax_total)
        .await?;
    Ok(Json(invoice))
}

pub async fn update_invoice(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<InvoiceDetailsUpdate>,
) -> Result<Json<Invoice>, ApiError> {
    Ok(Json(state.invoices.update_details(&actor, InvoiceId::from(id), request).await?))
}

pub async fn post_invoice(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, ApiError> {
    Ok(Json(state.invoices.post(&actor, InvoiceId::from(id)).await?))
}

pub async fn write_off_invoice(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, ApiError> {
    Ok(Json(state.invoices.write_off(&actor, InvoiceId::from(id)).await?))
}

/// Hard delete also removes every payment application against the invoice
pub async fn delete_invoice(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteParams>,
) -> Result<Response, ApiError> {
    let id = InvoiceId::from(id);
    if params.hard_delete {
        state.invoices.hard_delete(&actor, id).await?;
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(state.invoices.soft_delete(&actor, id).await?).into_response())
}

pub async fn restore_invoice(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, ApiError> {
    Ok(Json(state.invoices.restore(&actor, InvoiceId::from(id)).await?))
}
