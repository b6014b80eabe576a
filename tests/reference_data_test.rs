mod common;

use common::{TestApp, ADMIN_KEY};
use reqwest::Client;
use serde_json::json;

// =============================================================================
// Bank accounts
// =============================================================================

#[tokio::test]
async fn active_listing_filters_by_currency_and_activity() {
    let app = TestApp::spawn().await;
    let client = Client::new();
    app.seed_usd_account(&client).await;

    let response = client
        .post(format!("{}/bank-accounts", app.address))
        .header("X-Admin-Api-Key", ADMIN_KEY)
        .json(&json!({
            "payment_type": "Beneficiary",
            "bank_name": "Euro Bank",
            "currency": "EUR",
            "account_name": "Store Holdings",
            "account_number": "2000123456"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 201);
    let eur_account: serde_json::Value = response.json().await.unwrap();
    let eur_id = eur_account["_id"]["$oid"].as_str().unwrap().to_string();

    let response = client
        .get(format!("{}/bank-accounts/active?currency=USD", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    let usd: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(usd.len(), 1);
    assert_eq!(usd[0]["bank_name"], "First Commercial Bank");

    // Deactivate the EUR account; it disappears from the active listing
    let response = client
        .put(format!("{}/bank-accounts/{}", app.address, eur_id))
        .header("X-Admin-Api-Key", ADMIN_KEY)
        .json(&json!({ "is_active": false }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("{}/bank-accounts/active?currency=EUR", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    let eur: Vec<serde_json::Value> = response.json().await.unwrap();
    assert!(eur.is_empty());

    // Admin listing still shows both
    let response = client
        .get(format!("{}/bank-accounts", app.address))
        .header("X-Admin-Api-Key", ADMIN_KEY)
        .send()
        .await
        .expect("Failed to execute request");
    let all: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn bank_account_mutations_require_admin_key() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/bank-accounts", app.address))
        .json(&json!({
            "payment_type": "Beneficiary",
            "bank_name": "Euro Bank",
            "currency": "EUR",
            "account_name": "Store Holdings",
            "account_number": "2000123456"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 401);
}

// =============================================================================
// Products
// =============================================================================

#[tokio::test]
async fn product_crud_round_trip() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/products", app.address))
        .header("X-Admin-Api-Key", ADMIN_KEY)
        .json(&json!({ "name": "Ring", "price": 100.0 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 201);
    let product: serde_json::Value = response.json().await.unwrap();
    let id = product["_id"]["$oid"].as_str().unwrap().to_string();

    // Public listing
    let response = client
        .get(format!("{}/products", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    let products: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "Ring");

    let response = client
        .put(format!("{}/products/{}", app.address, id))
        .header("X-Admin-Api-Key", ADMIN_KEY)
        .json(&json!({ "price": 120.0 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);
    let updated: serde_json::Value = response.json().await.unwrap();
    assert_eq!(updated["price"], 120.0);

    let response = client
        .delete(format!("{}/products/{}", app.address, id))
        .header("X-Admin-Api-Key", ADMIN_KEY)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 204);

    let response = client
        .delete(format!("{}/products/{}", app.address, id))
        .header("X-Admin-Api-Key", ADMIN_KEY)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn product_mutations_require_admin_key() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/products", app.address))
        .json(&json!({ "name": "Ring", "price": 100.0 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 401);
}
