use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Payment channel recorded on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "SWIFT")]
    Swift,
    PayPal,
    Telebirr,
    #[serde(rename = "CBE")]
    Cbe,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Swift
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Confirmed,
    Failed,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

/// Order lifecycle. The cycle is strictly one-way; `Deleted` is a
/// tombstone, orders are never removed from the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "Pending Payment Invoice")]
    PendingPaymentInvoice,
    Completed,
    Deleted,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPaymentInvoice => "Pending Payment Invoice",
            OrderStatus::Completed => "Completed",
            OrderStatus::Deleted => "Deleted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending Payment Invoice" => Some(OrderStatus::PendingPaymentInvoice),
            "Completed" => Some(OrderStatus::Completed),
            "Deleted" => Some(OrderStatus::Deleted),
            _ => None,
        }
    }

    /// Next state in the toggle cycle. `None` means terminal; toggling a
    /// deleted order is a no-op.
    pub fn next(&self) -> Option<Self> {
        match self {
            OrderStatus::PendingPaymentInvoice => Some(OrderStatus::Completed),
            OrderStatus::Completed => Some(OrderStatus::Deleted),
            OrderStatus::Deleted => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cart line. Submission order and quantities are preserved exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInfo {
    #[serde(default)]
    pub method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
}

impl Default for PaymentInfo {
    fn default() -> Self {
        Self {
            method: PaymentMethod::default(),
            reference_number: None,
            status: PaymentStatus::default(),
            date: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub order_id: String,
    pub customer_name: String,
    pub email: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_method: Option<String>,
    pub payment: PaymentInfo,
    pub currency: String,
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub advance: f64,
    pub total: f64,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_of_payment_path: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_utc: DateTime<Utc>,
}

impl Order {
    /// Generate an order identifier when the client did not supply one.
    /// Microsecond resolution keeps back-to-back checkouts from
    /// colliding on the unique index.
    pub fn generate_order_id() -> String {
        format!("ORD-{}", Utc::now().timestamp_micros())
    }
}
