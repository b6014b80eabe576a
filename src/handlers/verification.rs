use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;
use crate::models::OrderItem;
use crate::services::{EmailAttachment, EmailMessage, InvoiceData};
use crate::startup::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct SendCodeRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Currency cannot be empty"))]
    pub currency: String,
    #[serde(default)]
    pub cart: Vec<OrderItem>,
}

#[derive(Debug, Serialize)]
pub struct SendCodeResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// Only populated when EXPOSE_VERIFICATION_CODE is set; never in
    /// production.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,
}

/// Issue a verification code and email it with the rendered payment
/// instructions. Fails without issuing anything when no active bank
/// account matches the currency, and fails loudly when delivery fails.
///
/// POST /checkout/send-code
#[tracing::instrument(skip(state, request), fields(currency = %request.currency))]
pub async fn send_code(
    State(state): State<AppState>,
    Json(request): Json<SendCodeRequest>,
) -> Result<(StatusCode, Json<SendCodeResponse>), AppError> {
    request.validate()?;

    let accounts = state.db.find_active_bank_accounts(&request.currency).await?;
    if accounts.is_empty() {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "No active bank account for currency {}",
            request.currency
        )));
    }

    let code = state.registry.issue(&request.email).await?;

    let invoice_path = state
        .renderer
        .render(&InvoiceData {
            email: request.email.clone(),
            currency: request.currency.clone(),
            items: request.cart.clone(),
            bank_accounts: accounts,
        })
        .await?;

    let invoice_bytes = tokio::fs::read(&invoice_path).await?;
    let filename = invoice_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "payment-instructions.txt".to_string());

    let message = EmailMessage {
        to: request.email.clone(),
        subject: "Your Verification Code".to_string(),
        body_text: format!("Your verification code is: {}", code),
        attachments: vec![EmailAttachment {
            filename,
            content_type: "text/plain".to_string(),
            data: invoice_bytes,
        }],
    };

    state
        .email_provider
        .send(&message)
        .await
        .map_err(|e| AppError::EmailError(e.to_string()))?;

    tracing::info!(email = %request.email, "Verification code delivered");

    Ok((
        StatusCode::OK,
        Json(SendCodeResponse {
            status: "sent".to_string(),
            expires_in: state.config.verification.code_ttl_seconds,
            code: state.config.verification.expose_code.then_some(code),
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    /// Accepted as either a JSON number or string; UIs send both.
    pub code: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct VerifyCodeResponse {
    pub verified: bool,
}

/// Redeem a verification code. A wrong or unknown code is a `false`
/// result, not an error.
///
/// POST /checkout/verify-code
#[tracing::instrument(skip(state, request))]
pub async fn verify_code(
    State(state): State<AppState>,
    Json(request): Json<VerifyCodeRequest>,
) -> Result<Json<VerifyCodeResponse>, AppError> {
    let code = match &request.code {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Code must be a number or string"
            )))
        }
    };

    let verified = state.registry.redeem(&request.email, &code).await?;

    Ok(Json(VerifyCodeResponse { verified }))
}
