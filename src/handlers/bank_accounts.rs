use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use mongodb::bson::{doc, oid::ObjectId, Document};
use serde::Deserialize;
use validator::Validate;

use crate::error::AppError;
use crate::models::BankAccount;
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct ActiveAccountsQuery {
    pub currency: String,
}

/// Active accounts for a currency, as shown on payment instructions.
///
/// GET /bank-accounts/active?currency=
#[tracing::instrument(skip(state))]
pub async fn list_active_bank_accounts(
    State(state): State<AppState>,
    Query(query): Query<ActiveAccountsQuery>,
) -> Result<Json<Vec<BankAccount>>, AppError> {
    let accounts = state.db.find_active_bank_accounts(&query.currency).await?;
    Ok(Json(accounts))
}

/// GET /bank-accounts (admin)
#[tracing::instrument(skip(state))]
pub async fn list_bank_accounts(
    State(state): State<AppState>,
) -> Result<Json<Vec<BankAccount>>, AppError> {
    let accounts = state.db.list_bank_accounts().await?;
    Ok(Json(accounts))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBankAccountRequest {
    #[validate(length(min = 1, message = "Payment type is required"))]
    pub payment_type: String,
    #[validate(length(min = 1, message = "Bank name is required"))]
    pub bank_name: String,
    pub branch: Option<String>,
    #[validate(length(min = 1, message = "Currency is required"))]
    pub currency: String,
    #[validate(length(min = 1, message = "Account name is required"))]
    pub account_name: String,
    #[validate(length(min = 1, message = "Account number is required"))]
    pub account_number: String,
    pub swift_code: Option<String>,
    pub aba_number: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// POST /bank-accounts (admin)
#[tracing::instrument(skip(state, request))]
pub async fn create_bank_account(
    State(state): State<AppState>,
    Json(request): Json<CreateBankAccountRequest>,
) -> Result<(StatusCode, Json<BankAccount>), AppError> {
    request.validate()?;

    let mut account = BankAccount {
        id: None,
        payment_type: request.payment_type,
        bank_name: request.bank_name,
        branch: request.branch,
        currency: request.currency,
        account_name: request.account_name,
        account_number: request.account_number,
        swift_code: request.swift_code,
        aba_number: request.aba_number,
        is_active: request.is_active,
    };

    let id = state.db.insert_bank_account(&account).await?;
    account.id = Some(id);

    tracing::info!(bank = %account.bank_name, currency = %account.currency, "Bank account created");

    Ok((StatusCode::CREATED, Json(account)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBankAccountRequest {
    pub payment_type: Option<String>,
    pub bank_name: Option<String>,
    pub branch: Option<String>,
    pub currency: Option<String>,
    pub account_name: Option<String>,
    pub account_number: Option<String>,
    pub swift_code: Option<String>,
    pub aba_number: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateBankAccountRequest {
    fn into_patch(self) -> Document {
        let mut patch = doc! {};
        if let Some(v) = self.payment_type {
            patch.insert("payment_type", v);
        }
        if let Some(v) = self.bank_name {
            patch.insert("bank_name", v);
        }
        if let Some(v) = self.branch {
            patch.insert("branch", v);
        }
        if let Some(v) = self.currency {
            patch.insert("currency", v);
        }
        if let Some(v) = self.account_name {
            patch.insert("account_name", v);
        }
        if let Some(v) = self.account_number {
            patch.insert("account_number", v);
        }
        if let Some(v) = self.swift_code {
            patch.insert("swift_code", v);
        }
        if let Some(v) = self.aba_number {
            patch.insert("aba_number", v);
        }
        if let Some(v) = self.is_active {
            patch.insert("is_active", v);
        }
        patch
    }
}

/// PUT /bank-accounts/:id (admin)
#[tracing::instrument(skip(state, request))]
pub async fn update_bank_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateBankAccountRequest>,
) -> Result<Json<BankAccount>, AppError> {
    let object_id = ObjectId::parse_str(&id)
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid bank account id: {}", id)))?;

    let patch = request.into_patch();
    if patch.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Update requires at least one field"
        )));
    }

    state
        .db
        .update_bank_account(object_id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Bank account not found: {}", id)))
}
