//! Admin-only catalog and order management.
//!
//! Mounted behind both the access middleware and the admin role check.

use axum::{extract::State, http::StatusCode};

use emporium_core::{OrderId, Validate};

use super::{ApiJson, ApiPath};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{NewProduct, Order, Product, StatusUpdateRequest};
use crate::services::OrderService;
use crate::state::AppState;

/// Add a product to the catalog.
#[tracing::instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn add_product(
    State(state): State<AppState>,
    RequireAuth(admin): RequireAuth,
    ApiJson(product): ApiJson<NewProduct>,
) -> Result<(StatusCode, ApiJson<Product>)> {
    product.validate()?;
    let product = state.store().create_product(&product).await?;
    tracing::info!(product_id = %product.id, name = %product.name, "product created");
    Ok((StatusCode::CREATED, ApiJson(product)))
}

/// Move an order to a new status.
#[tracing::instrument(skip_all, fields(admin_id = %admin.id, order_id = %id))]
pub async fn set_order_status(
    State(state): State<AppState>,
    RequireAuth(admin): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(request): ApiJson<StatusUpdateRequest>,
) -> Result<ApiJson<Order>> {
    let order = OrderService::new(state.store())
        .set_status(id, request.status)
        .await?;
    Ok(ApiJson(order))
}
