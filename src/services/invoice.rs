//! Payment-instruction document renderer.
//!
//! Produces the file attached to the verification email: the itemized
//! cart plus every active bank account matching the customer's currency.

use crate::error::AppError;
use crate::models::{BankAccount, OrderItem};
use std::fmt::Write as _;
use std::path::PathBuf;
use tokio::fs;

#[derive(Debug, Clone)]
pub struct InvoiceData {
    pub email: String,
    pub currency: String,
    pub items: Vec<OrderItem>,
    pub bank_accounts: Vec<BankAccount>,
}

#[derive(Clone)]
pub struct InvoiceRenderer {
    output_dir: PathBuf,
}

impl InvoiceRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Render the payment instructions and return the path of the
    /// generated file. Zero matching bank accounts is a render error;
    /// callers pre-check but the guard stays here.
    pub async fn render(&self, data: &InvoiceData) -> Result<PathBuf, AppError> {
        if data.bank_accounts.is_empty() {
            return Err(AppError::RenderError(format!(
                "No active bank accounts for currency {}",
                data.currency
            )));
        }

        let body = render_body(data);

        if !self.output_dir.exists() {
            fs::create_dir_all(&self.output_dir).await?;
        }

        let filename = format!("payment-instructions-{}.txt", uuid::Uuid::new_v4());
        let path = self.output_dir.join(filename);
        fs::write(&path, body).await?;

        tracing::info!(
            email = %data.email,
            currency = %data.currency,
            path = %path.display(),
            "Payment instructions rendered"
        );

        Ok(path)
    }
}

fn render_body(data: &InvoiceData) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "PAYMENT INSTRUCTIONS");
    let _ = writeln!(out, "Customer: {}", data.email);
    let _ = writeln!(out, "Currency: {}", data.currency);
    let _ = writeln!(out);

    let _ = writeln!(out, "Order summary");
    let _ = writeln!(
        out,
        "{:<30} {:>12} {:>8} {:>12}",
        "Item", "Unit price", "Qty", "Line total"
    );
    let mut grand_total = 0.0;
    for item in &data.items {
        let line_total = item.line_total();
        grand_total += line_total;
        let _ = writeln!(
            out,
            "{:<30} {:>12.2} {:>8} {:>12.2}",
            item.name, item.price, item.quantity, line_total
        );
    }
    let _ = writeln!(out, "{:<30} {:>34.2}", "Grand total", grand_total);
    let _ = writeln!(out);

    let _ = writeln!(out, "Bank accounts ({})", data.currency);
    for account in &data.bank_accounts {
        let _ = writeln!(out, "- {} ({})", account.bank_name, account.payment_type);
        let _ = writeln!(out, "  Account name:   {}", account.account_name);
        let _ = writeln!(out, "  Account number: {}", account.account_number);
        if let Some(branch) = &account.branch {
            let _ = writeln!(out, "  Branch:         {}", branch);
        }
        if let Some(swift) = &account.swift_code {
            let _ = writeln!(out, "  SWIFT:          {}", swift);
        }
        if let Some(aba) = &account.aba_number {
            let _ = writeln!(out, "  ABA:            {}", aba);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd_account() -> BankAccount {
        BankAccount {
            id: None,
            payment_type: "Beneficiary".to_string(),
            bank_name: "First Commercial Bank".to_string(),
            branch: Some("Main".to_string()),
            currency: "USD".to_string(),
            account_name: "Store Holdings".to_string(),
            account_number: "1000123456".to_string(),
            swift_code: Some("FCBKUS33".to_string()),
            aba_number: None,
            is_active: true,
        }
    }

    fn temp_renderer() -> InvoiceRenderer {
        let dir = std::env::temp_dir().join(format!("invoice-test-{}", uuid::Uuid::new_v4()));
        InvoiceRenderer::new(dir)
    }

    #[tokio::test]
    async fn renders_cart_lines_and_grand_total() {
        let renderer = temp_renderer();
        let data = InvoiceData {
            email: "x@y.com".to_string(),
            currency: "USD".to_string(),
            items: vec![
                OrderItem {
                    name: "Ring".to_string(),
                    price: 100.0,
                    quantity: 2,
                },
                OrderItem {
                    name: "Stone".to_string(),
                    price: 50.0,
                    quantity: 1,
                },
            ],
            bank_accounts: vec![usd_account()],
        };

        let path = renderer.render(&data).await.unwrap();
        let body = tokio::fs::read_to_string(&path).await.unwrap();

        assert!(body.contains("Ring"));
        assert!(body.contains("200.00"));
        assert!(body.contains("250.00"));
        assert!(body.contains("First Commercial Bank"));
        assert!(body.contains("FCBKUS33"));
    }

    #[tokio::test]
    async fn zero_accounts_is_a_render_error() {
        let renderer = temp_renderer();
        let data = InvoiceData {
            email: "x@y.com".to_string(),
            currency: "XYZ".to_string(),
            items: vec![],
            bank_accounts: vec![],
        };

        assert!(renderer.render(&data).await.is_err());
    }

    #[test]
    fn swift_is_omitted_when_absent() {
        let mut account = usd_account();
        account.swift_code = None;
        let data = InvoiceData {
            email: "x@y.com".to_string(),
            currency: "USD".to_string(),
            items: vec![],
            bank_accounts: vec![account],
        };

        let body = render_body(&data);
        assert!(!body.contains("SWIFT"));
    }
}
