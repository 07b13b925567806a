//! Order history, cancellation and status administration.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use emporium_integration_tests::{TestApp, TestUser};

async fn place_order(app: &TestApp, user: &TestUser, product: i64) -> i64 {
    let response = app
        .post(
            "/cart/instant_buy",
            Some(&user.token),
            json!({ "product_ids": [product], "payment_method": "Digital" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    response.body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn orders_are_listed_newest_first() {
    let app = TestApp::new();
    let admin = app.admin("root").await;
    let lamp = app.add_product(&admin, "Desk Lamp", "19.99").await;
    let user = app.signup("ada").await;
    let first = place_order(&app, &user, lamp).await;
    let second = place_order(&app, &user, lamp).await;

    let response = app.get("/users/orders", Some(&user.token)).await;

    assert_eq!(response.status, StatusCode::OK);
    let ids: Vec<i64> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![second, first]);

    // Other users see only their own orders.
    let other = app.signup("grace").await;
    let response = app.get("/users/orders", Some(&other.token)).await;
    assert_eq!(response.body, json!([]));
}

#[tokio::test]
async fn owner_cancels_pending_order_once() {
    let app = TestApp::new();
    let admin = app.admin("root").await;
    let lamp = app.add_product(&admin, "Desk Lamp", "19.99").await;
    let user = app.signup("ada").await;
    let order = place_order(&app, &user, lamp).await;
    let uri = format!("/users/orders/{order}/cancel");

    let response = app.post(&uri, Some(&user.token), json!({})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "Canceled");

    let response = app.post(&uri, Some(&user.token), json!({})).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn cancelling_someone_elses_order_is_not_found() {
    let app = TestApp::new();
    let admin = app.admin("root").await;
    let lamp = app.add_product(&admin, "Desk Lamp", "19.99").await;
    let owner = app.signup("ada").await;
    let order = place_order(&app, &owner, lamp).await;
    let intruder = app.signup("mallory").await;

    let response = app
        .post(
            &format!("/users/orders/{order}/cancel"),
            Some(&intruder.token),
            json!({}),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_advances_status_along_lifecycle() {
    let app = TestApp::new();
    let admin = app.admin("root").await;
    let lamp = app.add_product(&admin, "Desk Lamp", "19.99").await;
    let user = app.signup("ada").await;
    let order = place_order(&app, &user, lamp).await;
    let uri = format!("/admin/orders/{order}/status");

    let response = app
        .post(&uri, Some(&admin.token), json!({ "status": "Shipped" }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "Shipped");

    let response = app
        .post(&uri, Some(&admin.token), json!({ "status": "Delivered" }))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    // Delivered is terminal.
    let response = app
        .post(&uri, Some(&admin.token), json!({ "status": "Canceled" }))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let response = app
        .post(
            &format!("/users/orders/{order}/cancel"),
            Some(&user.token),
            json!({}),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn status_update_requires_admin_and_existing_order() {
    let app = TestApp::new();
    let admin = app.admin("root").await;
    let user = app.signup("ada").await;

    let response = app
        .post(
            "/admin/orders/1/status",
            Some(&user.token),
            json!({ "status": "Shipped" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .post(
            "/admin/orders/404/status",
            Some(&admin.token),
            json!({ "status": "Shipped" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .post(
            "/admin/orders/abc/status",
            Some(&admin.token),
            json!({ "status": "Shipped" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
