//! Customer handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::{Actor, CustomerId};
use domain_party::{Customer, CustomerUpdate, NewCustomer};

use crate::dto::{DeleteParams, ListParams};
use crate::{error::ApiError, AppState};

pub async fn create_customer(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<NewCustomer>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let customer = state.customers.create(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn list_customers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    Ok(Json(state.customers.list(params.query()).await?))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>, ApiError> {
    Ok(Json(state.customers.get(CustomerId::from(id)).await?))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<CustomerUpdate>,
) -> Result<Json<Customer>, ApiError> {
    Ok(Json(state.customers.update(&actor, CustomerId::from(id), request).await?))
}

/// Soft deletes by default; `?hard_delete=true` removes the row
pub async fn delete_customer(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteParams>,
) -> Result<Response, ApiError> {
    let id = CustomerId::from(id);
    if params.hard_delete {
        state.customers.hard_delete(&actor, id).await?;
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(state.customers.soft_delete(&actor, id).await?).into_response())
}

pub async fn restore_customer(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>, ApiError> {
    Ok(Json(state.customers.restore(&actor, CustomerId::from(id)).await?))
}
