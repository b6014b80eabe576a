use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Reference record for a bank account shown on payment instructions.
/// Read-only from the checkout flow; mutated only by admin CRUD.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// "Beneficiary" or "Intermediary".
    pub payment_type: String,
    pub bank_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub currency: String,
    pub account_name: String,
    pub account_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swift_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aba_number: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}
