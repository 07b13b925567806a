//! The caller's orders.

use axum::extract::State;

use emporium_core::OrderId;

use super::{ApiJson, ApiPath};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::services::OrderService;
use crate::state::AppState;

/// List the caller's orders, newest first.
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<ApiJson<Vec<Order>>> {
    Ok(ApiJson(state.store().list_orders(user.id).await?))
}

/// Cancel one of the caller's orders.
#[tracing::instrument(skip_all, fields(user_id = %user.id, order_id = %id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<ApiJson<Order>> {
    let order = OrderService::new(state.store()).cancel(user.id, id).await?;
    Ok(ApiJson(order))
}
