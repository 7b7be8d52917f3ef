//! Order handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{Actor, OrderId};
use domain_sales::{Order, OrderDetailsUpdate, OrderStatus};

use crate::dto::sales::{CreateOrderRequest, ReplaceOrderLinesRequest, TransitionOrderRequest};
use crate::dto::{DeleteParams, ListParams};
use crate::{error::ApiError, AppState};

pub async fn create_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    request.validate()?;
    let order = state.orders.create(&actor, request.into()).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.orders.list(params.customer(), params.query()).await?))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.get(OrderId::from(id)).await?))
}

pub async fn replace_lines(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReplaceOrderLinesRequest>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .orders
        .replace_lines(&actor, OrderId::from(id), request.lines)
        .await?;
    Ok(Json(order))
}

pub async fn update_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<OrderDetailsUpdate>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.update_details(&actor, OrderId::from(id), request).await?))
}

pub async fn transition_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<TransitionOrderRequest>,
) -> Result<Json<Order>, ApiError> {
    transition(&state, &actor, id, request.status).await
}

pub async fn confirm_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    transition(&state, &actor, id, OrderStatus::Confirmed).await
}

pub async fn fulfill_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    transition(&state, &actor, id, OrderStatus::Fulfilled).await
}

pub async fn close_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    transition(&state, &actor, id, OrderStatus::Closed).await
}

async fn transition(
    state: &AppState,
    actor: &Actor,
    id: Uuid,
    next: OrderStatus,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.transition(actor, OrderId::from(id), next).await?))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteParams>,
) -> Result<Response, ApiError> {
    let id = OrderId::from(id);
    if params.hard_delete {
        state.orders.hard_delete(&actor, id).await?;
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(state.orders.soft_delete(&actor, id).await?).into_response())
}

pub async fn restore_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.restore(&actor, OrderId::from(id)).await?))
}
