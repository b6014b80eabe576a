mod common;

use common::{TestApp, ADMIN_KEY};
use reqwest::multipart::Form;
use reqwest::Client;
use serde_json::json;

async fn create_order(app: &TestApp, client: &Client) -> String {
    let order = json!({
        "customer_name": "Jane Doe",
        "email": "x@y.com",
        "address": "1 Main St",
        "currency": "USD",
        "items": [{ "name": "Ring", "price": 100.0, "quantity": 2 }],
        "total": 200.0
    });

    let response = client
        .post(format!("{}/checkout/confirm", app.address))
        .multipart(Form::new().text("order", order.to_string()))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 201);

    let created: serde_json::Value = response.json().await.unwrap();
    created["order_id"].as_str().unwrap().to_string()
}

async fn toggle(app: &TestApp, client: &Client, order_id: &str) -> serde_json::Value {
    let response = client
        .put(format!("{}/orders/{}/status", app.address, order_id))
        .header("X-Admin-Api-Key", ADMIN_KEY)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);
    response.json().await.unwrap()
}

#[tokio::test]
async fn status_toggle_walks_the_one_way_cycle() {
    let app = TestApp::spawn().await;
    let client = Client::new();
    let order_id = create_order(&app, &client).await;

    let order = toggle(&app, &client, &order_id).await;
    assert_eq!(order["status"], "Completed");

    let order = toggle(&app, &client, &order_id).await;
    assert_eq!(order["status"], "Deleted");

    // Terminal state is idempotent
    let order = toggle(&app, &client, &order_id).await;
    assert_eq!(order["status"], "Deleted");

    // Deleted orders stay in the collection
    let response = client
        .get(format!("{}/orders/id/{}", app.address, order_id))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn status_toggle_requires_admin_key() {
    let app = TestApp::spawn().await;
    let client = Client::new();
    let order_id = create_order(&app, &client).await;

    let response = client
        .put(format!("{}/orders/{}/status", app.address, order_id))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 401);

    let response = client
        .put(format!("{}/orders/{}/status", app.address, order_id))
        .header("X-Admin-Api-Key", "wrong-key")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn toggling_unknown_order_is_not_found() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .put(format!("{}/orders/ORD-0/status", app.address))
        .header("X-Admin-Api-Key", ADMIN_KEY)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn list_orders_filters_by_status() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let first = create_order(&app, &client).await;
    let second = create_order(&app, &client).await;
    toggle(&app, &client, &second).await;

    let response = client
        .get(format!("{}/orders", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    let all: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(all.len(), 2);

    let response = client
        .get(format!(
            "{}/orders?status=Pending%20Payment%20Invoice",
            app.address
        ))
        .send()
        .await
        .expect("Failed to execute request");
    let pending: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["order_id"], first.as_str());

    let response = client
        .get(format!("{}/orders?status=Shipped", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn get_unknown_order_is_not_found() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/orders/id/ORD-0", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 404);
}
