//! Order DTOs

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use core_kernel::{Currency, CustomerId, UserId};
use domain_sales::{CreateOrder, LineInput, OrderStatus};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub customer_id: CustomerId,
    #[serde(default)]
    pub lines: Vec<LineInput>,
    pub currency: Option<Currency>,
    #[validate(length(max = 128))]
    pub external_ref: Option<String>,
    pub order_date: Option<DateTime<Utc>>,
    pub status: Option<OrderStatus>,
    #[validate(length(max = 4000))]
    pub notes: Option<String>,
    pub owner: Option<UserId>,
}

impl From<CreateOrderRequest> for CreateOrder {
    fn from(request: CreateOrderRequest) -> Self {
        CreateOrder {
            currency: request.currency,
            external_ref: request.external_ref,
            order_date: request.order_date,
            status: request.status,
            notes: request.notes,
            owner: request.owner,
            ..CreateOrder::new(request.customer_id, request.lines)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReplaceOrderLinesRequest {
    pub lines: Vec<LineInput>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionOrderRequest {
    pub status: OrderStatus,
}
