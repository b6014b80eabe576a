use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppError;
use crate::handlers::orders::OrderResponse;
use crate::models::{Order, OrderItem, OrderStatus, PaymentInfo, PaymentMethod};
use crate::startup::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmOrderRequest {
    /// Client-supplied identifier; generated when absent.
    pub order_id: Option<String>,
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    pub shipping_method: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    #[validate(length(min = 1, message = "Currency cannot be empty"))]
    pub currency: String,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub advance: f64,
    pub total: f64,
}

/// Finalize a checkout: multipart with an `order` JSON part and an
/// optional `proof_of_payment` file part. Reachable without prior code
/// redemption unless REQUIRE_VERIFIED_EMAIL is on.
///
/// POST /checkout/confirm
#[tracing::instrument(skip(state, multipart))]
pub async fn confirm_order(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    let mut order_json: Option<String> = None;
    let mut proof: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("order") => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Failed to read order part: {}", e))
                })?;
                order_json = Some(text);
            }
            Some("proof_of_payment") => {
                let file_name = field.file_name().unwrap_or("proof").to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Failed to read proof file: {}", e))
                })?;
                proof = Some((file_name, data.to_vec()));
            }
            _ => {}
        }
    }

    let order_json = order_json.ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!("Missing required multipart part: order"))
    })?;

    let request: ConfirmOrderRequest = serde_json::from_str(&order_json)
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid order payload: {}", e)))?;
    request.validate()?;

    if request.total <= 0.0 {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Order total must be positive"
        )));
    }

    if state.config.verification.require_verified_email
        && !state.registry.is_verified(&request.email).await?
    {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Email {} has not been verified",
            request.email
        )));
    }

    let proof_of_payment_path = match proof {
        Some((file_name, data)) => {
            let key = format!("proofs/{}-{}", uuid::Uuid::new_v4(), file_name);
            let path = state.storage.store(&key, data).await?;
            tracing::info!(path = %path, "Proof of payment stored");
            Some(path)
        }
        None => None,
    };

    let order = Order {
        id: None,
        order_id: request
            .order_id
            .unwrap_or_else(Order::generate_order_id),
        customer_name: request.customer_name,
        email: request.email,
        address: request.address,
        shipping_method: request.shipping_method,
        payment: PaymentInfo {
            method: request.payment_method,
            reference_number: request.payment_reference,
            ..PaymentInfo::default()
        },
        currency: request.currency,
        items: request.items,
        advance: request.advance,
        total: request.total,
        status: OrderStatus::PendingPaymentInvoice,
        proof_of_payment_path,
        created_utc: Utc::now(),
    };

    state.db.insert_order(&order).await?;

    tracing::info!(order_id = %order.order_id, total = order.total, "Order confirmed");

    Ok((StatusCode::CREATED, Json(OrderResponse::from(order))))
}
