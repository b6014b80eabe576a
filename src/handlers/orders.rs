use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus};
use crate::startup::AppState;

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order_id: String,
    pub customer_name: String,
    pub email: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_method: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    pub currency: String,
    pub items: Vec<OrderItem>,
    pub advance: f64,
    pub total: f64,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_of_payment_path: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.order_id,
            customer_name: order.customer_name,
            email: order.email,
            address: order.address,
            shipping_method: order.shipping_method,
            payment_method: order.payment.method,
            payment_status: order.payment.status,
            payment_reference: order.payment.reference_number,
            currency: order.currency,
            items: order.items,
            advance: order.advance,
            total: order.total,
            status: order.status,
            proof_of_payment_path: order.proof_of_payment_path,
            created_utc: order.created_utc,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
}

/// List orders, newest first, optionally filtered by status.
///
/// GET /orders?status=
#[tracing::instrument(skip(state))]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    let status = match &query.status {
        Some(s) => Some(OrderStatus::parse(s).ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!(
                "Invalid status: {}. Must be one of: Pending Payment Invoice, Completed, Deleted",
                s
            ))
        })?),
        None => None,
    };

    let orders = state.db.list_orders(status).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// GET /orders/id/:id
#[tracing::instrument(skip(state))]
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderResponse>, AppError> {
    state
        .db
        .find_order(&order_id)
        .await?
        .map(|order| Json(OrderResponse::from(order)))
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Order not found: {}", order_id)))
}

/// Advance an order one step along the status cycle. A deleted order is
/// terminal; toggling it returns the order unchanged.
///
/// PUT /orders/:id/status (admin)
#[tracing::instrument(skip(state))]
pub async fn toggle_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderResponse>, AppError> {
    let mut order = state
        .db
        .find_order(&order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Order not found: {}", order_id)))?;

    if let Some(next) = order.status.next() {
        state.db.set_order_status(&order_id, next).await?;
        tracing::info!(order_id = %order_id, from = %order.status, to = %next, "Order status advanced");
        order.status = next;
    }

    Ok(Json(OrderResponse::from(order)))
}
