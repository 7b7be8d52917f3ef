//! Payment handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{Actor, PaymentId};
use domain_billing::{Payment, PaymentApplication};

use crate::dto::billing::{
    AllocationResponse, ApplyPaymentRequest, CreatePaymentRequest, PaymentResponse,
};
use crate::dto::{DeleteParams, ListParams};
use crate::{error::ApiError, AppState};

pub async fn create_payment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    request.validate()?;
    let payment = state.payments.create(&actor, request.into()).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn list_payments(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    Ok(Json(state.payments.list(params.customer(), params.query()).await?))
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let id = PaymentId::from(id);
    let payment = state.payments.get(id).await?;
    let remaining = state.payments.remaining_balance(id).await?;
    Ok(Json(PaymentResponse { payment, remaining }))
}

pub async fn apply_payment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<ApplyPaymentRequest>,
) -> Result<(StatusCode, Json<AllocationResponse>), ApiError> {
    let allocation = state
        .payments
        .apply(&actor, PaymentId::from(id), request.invoice_id, request.amount)
        .await?;
    Ok((StatusCode::CREATED, Json(allocation.into())))
}

pub async fn list_applications(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PaymentApplication>>, ApiError> {
    Ok(Json(state.payments.applications(PaymentId::from(id)).await?))
}

pub async fn delete_payment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteParams>,
) -> Result<Response, ApiError> {
    let id = PaymentId::from(id);
    if params.hard_delete {
        state.payments.hard_delete(&actor, id).await?;
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(state.payments.soft_delete(&actor, id).await?).into_response())
}

pub async fn restore_payment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Payment>, ApiError> {
    Ok(Json(state.payments.restore(&actor, PaymentId::from(id)).await?))
}
