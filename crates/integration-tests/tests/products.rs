//! Catalog scenarios: adding, listing and searching products.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use emporium_integration_tests::{TestApp, product_body};

#[tokio::test]
async fn admin_adds_product() {
    let app = TestApp::new();
    let admin = app.admin("root").await;

    let response = app
        .post(
            "/admin/add_product",
            Some(&admin.token),
            product_body("Desk Lamp", "19.99"),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["name"], "Desk Lamp");
    assert_eq!(response.body["price"], "19.99");
    assert_eq!(response.body["rating"], 4.5);
}

#[tokio::test]
async fn invalid_product_is_rejected() {
    let app = TestApp::new();
    let admin = app.admin("root").await;

    let response = app
        .post(
            "/admin/add_product",
            Some(&admin.token),
            product_body("Desk Lamp", "0"),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["field"], "price");

    let mut body = product_body("Desk Lamp", "10.00");
    body["image"] = json!("not a url");
    let response = app
        .post("/admin/add_product", Some(&admin.token), body)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["field"], "image");
}

#[tokio::test]
async fn price_beyond_storage_precision_is_rejected() {
    let app = TestApp::new();
    let admin = app.admin("root").await;

    for price in ["0.001", "1000000000000"] {
        let response = app
            .post(
                "/admin/add_product",
                Some(&admin.token),
                product_body("Desk Lamp", price),
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{price}");
        assert_eq!(response.body["field"], "price");
    }

    let listing = app.get("/users/product_view", Some(&admin.token)).await;
    assert_eq!(listing.body, json!([]));
}

#[tokio::test]
async fn product_view_is_ordered_and_idempotent() {
    let app = TestApp::new();
    let admin = app.admin("root").await;
    let first = app.add_product(&admin, "Desk Lamp", "19.99").await;
    let second = app.add_product(&admin, "Bookshelf", "89.00").await;

    let a = app.get("/users/product_view", Some(&admin.token)).await;
    let b = app.get("/users/product_view", Some(&admin.token)).await;

    assert_eq!(a.status, StatusCode::OK);
    assert_eq!(a.body, b.body);
    let ids: Vec<i64> = a
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![first, second]);
}

#[tokio::test]
async fn search_filters_by_name_and_price() {
    let app = TestApp::new();
    let admin = app.admin("root").await;
    app.add_product(&admin, "Desk Lamp", "19.99").await;
    app.add_product(&admin, "Floor Lamp", "59.00").await;
    app.add_product(&admin, "Bookshelf", "89.00").await;

    let response = app.get("/users/search?name=lamp", Some(&admin.token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.as_array().unwrap().len(), 2);

    let response = app
        .get("/users/search?name=LAMP&max_price=20", Some(&admin.token))
        .await;
    let names: Vec<&str> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Desk Lamp"]);

    let response = app.get("/users/search", Some(&admin.token)).await;
    assert_eq!(response.body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn search_rejects_inverted_price_range() {
    let app = TestApp::new();
    let user = app.signup("ada").await;

    let response = app
        .get("/users/search?min_price=50&max_price=10", Some(&user.token))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["field"], "max_price");
}

#[tokio::test]
async fn search_rejects_unparsable_query() {
    let app = TestApp::new();
    let user = app.signup("ada").await;

    let response = app
        .get("/users/search?min_price=cheap", Some(&user.token))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
