//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Liveness
//! GET  /health/ready                 - Readiness (storage ping)
//!
//! # Public
//! POST /users/signup                 - Create account, issue tokens
//! POST /users/login                  - Verify credentials, issue tokens
//! POST /users/refresh                - Rotate token pair
//!
//! # Token required
//! POST /users/logout                 - Revoke stored tokens
//! GET  /users/product_view           - List products
//! GET  /users/search                 - Filter products
//! GET  /users/orders                 - Caller's orders
//! POST /users/orders/{id}/cancel     - Cancel own order
//! GET  /cart                         - Caller's cart
//! POST /cart/add_to_cart             - Add product
//! POST /cart/remove_item             - Remove product
//! POST /cart/cart_checkout           - Cart to order
//! POST /cart/instant_buy             - Order without cart
//!
//! # Token and admin role required
//! POST /admin/add_product            - Create product
//! POST /admin/orders/{id}/status     - Change order status
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod products;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts},
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;

use crate::error::AppError;
use crate::middleware::{authenticate, require_admin};
use crate::state::AppState;

/// JSON extractor and response whose rejections render as [`AppError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Query string extractor whose rejections render as [`AppError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Path extractor whose rejections render as [`AppError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Create the user routes that need a token.
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/logout", post(auth::logout))
        .route("/product_view", get(products::product_view))
        .route("/search", get(products::search))
        .route("/orders", get(orders::list))
        .route("/orders/{id}/cancel", post(orders::cancel))
}

/// Create the cart routes router.
fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add_to_cart", post(cart::add))
        .route("/remove_item", post(cart::remove))
        .route("/cart_checkout", post(cart::checkout))
        .route("/instant_buy", post(cart::instant_buy))
}

/// Create the admin routes router, guarded by the role check.
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/add_product", post(admin::add_product))
        .route("/orders/{id}/status", post(admin::set_order_status))
        .route_layer(axum_middleware::from_fn(require_admin))
}

/// Create all routes.
///
/// Every route except health, signup, login and refresh passes through the
/// access middleware before reaching its handler.
pub fn routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/users/signup", post(auth::signup))
        .route("/users/login", post(auth::login))
        .route("/users/refresh", post(auth::refresh));

    let protected = Router::new()
        .nest("/users", user_routes())
        .nest("/cart", cart_routes())
        .nest("/admin", admin_routes())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            authenticate,
        ));

    public.merge(protected)
}
