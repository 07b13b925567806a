//! Cart operations and checkout.

use axum::{extract::State, http::StatusCode};

use super::ApiJson;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Cart, CartItemRequest, CheckoutRequest, InstantBuyRequest, Order};
use crate::services::OrderService;
use crate::state::AppState;

/// The caller's cart. Users who never added anything get an empty cart.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<ApiJson<Cart>> {
    let cart = state
        .store()
        .find_cart(user.id)
        .await?
        .unwrap_or_else(|| Cart::empty(user.id));

    Ok(ApiJson(cart))
}

/// Add one unit of a product.
#[tracing::instrument(skip_all, fields(user_id = %user.id, product_id = %item.product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(item): ApiJson<CartItemRequest>,
) -> Result<ApiJson<Cart>> {
    let cart = state.store().add_to_cart(user.id, item.product_id).await?;
    tracing::info!(items = cart.product_ids.len(), total = %cart.total_price, "added to cart");
    Ok(ApiJson(cart))
}

/// Remove one unit of a product.
#[tracing::instrument(skip_all, fields(user_id = %user.id, product_id = %item.product_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(item): ApiJson<CartItemRequest>,
) -> Result<ApiJson<Cart>> {
    let cart = state
        .store()
        .remove_from_cart(user.id, item.product_id)
        .await?;
    tracing::info!(items = cart.product_ids.len(), total = %cart.total_price, "removed from cart");
    Ok(ApiJson(cart))
}

/// Place an order for everything in the cart and empty it.
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<(StatusCode, ApiJson<Order>)> {
    let order = state
        .store()
        .checkout_cart(user.id, request.payment_method)
        .await?;
    tracing::info!(order_id = %order.id, total = %order.total_price, "cart checked out");
    Ok((StatusCode::CREATED, ApiJson(order)))
}

/// Place an order without touching the cart.
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn instant_buy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<InstantBuyRequest>,
) -> Result<(StatusCode, ApiJson<Order>)> {
    let order = OrderService::new(state.store())
        .instant_buy(user.id, request.product_ids, request.payment_method)
        .await?;
    Ok((StatusCode::CREATED, ApiJson(order)))
}
