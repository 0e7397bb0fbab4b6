//! End-to-end flows against a running server.
//!
//! Needs `hs-cli migrate` and `hs-cli seed` on the server's database. Run with
//! `cargo test -p hardware-store-integration-tests -- --ignored`.

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

use hardware_store_integration_tests::live_base_url;

struct Customer {
    client: Client,
    base: String,
    token: String,
}

impl Customer {
    async fn register() -> Self {
        let client = Client::new();
        let base = live_base_url();
        let email = format!("it-{}@hardwarestore.com", Uuid::new_v4().simple());

        let response = client
            .post(format!("{base}/api/auth/register"))
            .json(&json!({
                "email": email,
                "password": "correct horse battery",
                "full_name": "Integration Tester",
                "phone": "+254700000001",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let session: Value = response.json().await.unwrap();
        assert_eq!(session["user"]["email"], email);
        assert_eq!(session["user"]["role"], "customer");

        Self {
            client,
            base,
            token: session["token"].as_str().unwrap().to_owned(),
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{path}", self.base))
            .bearer_auth(&self.token)
    }

    fn post(&self, path: &str, body: &Value) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{path}", self.base))
            .bearer_auth(&self.token)
            .json(body)
    }
}

async fn first_in_stock_product(client: &Client) -> Value {
    let page: Value = client
        .get(format!("{}/api/catalog/products?limit=50", live_base_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    page["products"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["stock_quantity"].as_i64().unwrap_or(0) > 1)
        .cloned()
        .expect("seeded catalog has stock")
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_health_full() {
    let response = reqwest::get(format!("{}/health/full", live_base_url()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["database"]["status"], "healthy");
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_duplicate_registration_conflicts() {
    let client = Client::new();
    let email = format!("dup-{}@hardwarestore.com", Uuid::new_v4().simple());
    let body = json!({
        "email": email,
        "password": "correct horse battery",
        "full_name": "Dup",
    });

    let url = format!("{}/api/auth/register", live_base_url());
    let first = client.post(&url).json(&body).send().await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = client.post(&url).json(&body).send().await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_cart_to_cancelled_order() {
    let customer = Customer::register().await;
    let product = first_in_stock_product(&customer.client).await;

    let response = customer
        .post(
            "/api/cart/items",
            &json!({ "product_id": product["id"], "quantity": 1 }),
        )
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let cart: Value = customer.get("/api/cart").send().await.unwrap().json().await.unwrap();
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);

    let response = customer
        .post(
            "/api/orders",
            &json!({
                "address": {
                    "label": "Home",
                    "line": "12 Moi Avenue",
                    "city": "Nairobi",
                    "country": "Kenya",
                },
            }),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    let order_id = created["order_id"].as_str().unwrap().to_owned();

    // The cart is emptied by checkout.
    let cart: Value = customer.get("/api/cart").send().await.unwrap().json().await.unwrap();
    assert!(cart["items"].as_array().unwrap().is_empty());

    let order: Value = customer
        .get(&format!("/api/orders/{order_id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(order["status"], "pending");
    assert_eq!(order["items"].as_array().unwrap().len(), 1);

    let response = customer
        .post(&format!("/api/orders/{order_id}/cancel"), &json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cancelled: Value = response.json().await.unwrap();
    assert_eq!(cancelled["order"]["status"], "cancelled");

    // A second cancel is refused.
    let response = customer
        .post(&format!("/api/orders/{order_id}/cancel"), &json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_other_customers_orders_are_hidden() {
    let owner = Customer::register().await;
    let stranger = Customer::register().await;
    let product = first_in_stock_product(&owner.client).await;

    owner
        .post(
            "/api/cart/items",
            &json!({ "product_id": product["id"], "quantity": 1 }),
        )
        .send()
        .await
        .unwrap();
    let created: Value = owner
        .post(
            "/api/checkout/place",
            &json!({
                "address": {
                    "label": "Shop",
                    "line": "4 Tom Mboya Street",
                    "city": "Nairobi",
                    "country": "Kenya",
                },
            }),
        )
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let order_id = created["order_id"].as_str().unwrap();

    let response = stranger
        .get(&format!("/api/orders/{order_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_customer_cannot_reach_admin() {
    let customer = Customer::register().await;
    let response = customer.get("/api/admin/users").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
