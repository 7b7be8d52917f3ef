//! Product handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::{Actor, ProductId};
use domain_catalog::{NewProduct, Product, ProductUpdate};

use crate::dto::{DeleteParams, ListParams};
use crate::{error::ApiError, AppState};

pub async fn create_product(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = state.products.create(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.products.list(params.query()).await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.products.get(ProductId::from(id)).await?))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<ProductUpdate>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.products.update(&actor, ProductId::from(id), request).await?))
}

/// Soft deletes by default; `?hard_delete=true` removes the row
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteParams>,
) -> Result<Response, ApiError> {
    let id = ProductId::from(id);
    if params.hard_delete {
        state.products.hard_delete(&actor, id).await?;
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(state.products.soft_delete(&actor, id).await?).into_response())
}

pub async fn restore_product(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.products.restore(&actor, ProductId::from(id)).await?))
}
