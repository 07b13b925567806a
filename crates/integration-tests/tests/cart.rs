//! Cart, checkout and instant-buy scenarios.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use emporium_integration_tests::TestApp;

#[tokio::test]
async fn new_user_sees_empty_cart() {
    let app = TestApp::new();
    let user = app.signup("ada").await;

    let response = app.get("/cart", Some(&user.token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["product_ids"], json!([]));
    assert_eq!(response.body["total_price"], "0");
}

#[tokio::test]
async fn add_and_remove_reprice_the_cart() {
    let app = TestApp::new();
    let admin = app.admin("root").await;
    let lamp = app.add_product(&admin, "Desk Lamp", "19.99").await;
    let shelf = app.add_product(&admin, "Bookshelf", "80.01").await;
    let user = app.signup("ada").await;

    for id in [lamp, lamp, shelf] {
        let response = app
            .post("/cart/add_to_cart", Some(&user.token), json!({ "product_id": id }))
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }
    let cart = app.get("/cart", Some(&user.token)).await;
    assert_eq!(cart.body["product_ids"], json!([lamp, lamp, shelf]));
    assert_eq!(cart.body["total_price"], "119.99");

    // Removing takes out a single occurrence.
    let response = app
        .post("/cart/remove_item", Some(&user.token), json!({ "product_id": lamp }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["product_ids"], json!([lamp, shelf]));
    assert_eq!(response.body["total_price"], "100.00");
}

#[tokio::test]
async fn unknown_product_cannot_be_added() {
    let app = TestApp::new();
    let user = app.signup("ada").await;

    let response = app
        .post("/cart/add_to_cart", Some(&user.token), json!({ "product_id": 999 }))
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn removing_absent_item_is_not_found() {
    let app = TestApp::new();
    let user = app.signup("ada").await;

    let response = app
        .post("/cart/remove_item", Some(&user.token), json!({ "product_id": 1 }))
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_cart_checkout_creates_no_order() {
    let app = TestApp::new();
    let user = app.signup("ada").await;

    let response = app
        .post(
            "/cart/cart_checkout",
            Some(&user.token),
            json!({ "payment_method": "Digital" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["field"], "product_ids");

    let orders = app.get("/users/orders", Some(&user.token)).await;
    assert_eq!(orders.body, json!([]));
}

#[tokio::test]
async fn checkout_turns_cart_into_order() {
    let app = TestApp::new();
    let admin = app.admin("root").await;
    let lamp = app.add_product(&admin, "Desk Lamp", "19.99").await;
    let user = app.signup("ada").await;
    app.post("/cart/add_to_cart", Some(&user.token), json!({ "product_id": lamp }))
        .await;
    app.post("/cart/add_to_cart", Some(&user.token), json!({ "product_id": lamp }))
        .await;

    let response = app
        .post(
            "/cart/cart_checkout",
            Some(&user.token),
            json!({ "payment_method": "COD" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["product_ids"], json!([lamp, lamp]));
    assert_eq!(response.body["total_price"], "39.98");
    assert_eq!(response.body["payment_method"], "COD");
    assert_eq!(response.body["status"], "Pending");

    let cart = app.get("/cart", Some(&user.token)).await;
    assert_eq!(cart.body["product_ids"], json!([]));
    assert_eq!(cart.body["total_price"], "0");
}

#[tokio::test]
async fn unknown_payment_method_is_bad_request() {
    let app = TestApp::new();
    let user = app.signup("ada").await;

    let response = app
        .post(
            "/cart/cart_checkout",
            Some(&user.token),
            json!({ "payment_method": "Barter" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn instant_buy_leaves_cart_alone() {
    let app = TestApp::new();
    let admin = app.admin("root").await;
    let lamp = app.add_product(&admin, "Desk Lamp", "19.99").await;
    let shelf = app.add_product(&admin, "Bookshelf", "89.00").await;
    let user = app.signup("ada").await;
    app.post("/cart/add_to_cart", Some(&user.token), json!({ "product_id": shelf }))
        .await;

    let response = app
        .post(
            "/cart/instant_buy",
            Some(&user.token),
            json!({ "product_ids": [lamp], "payment_method": "Digital" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["total_price"], "19.99");

    let cart = app.get("/cart", Some(&user.token)).await;
    assert_eq!(cart.body["product_ids"], json!([shelf]));
}

#[tokio::test]
async fn instant_buy_rejects_empty_and_unknown_products() {
    let app = TestApp::new();
    let user = app.signup("ada").await;

    let response = app
        .post(
            "/cart/instant_buy",
            Some(&user.token),
            json!({ "product_ids": [], "payment_method": "Digital" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["field"], "product_ids");

    let response = app
        .post(
            "/cart/instant_buy",
            Some(&user.token),
            json!({ "product_ids": [42], "payment_method": "Digital" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
