//! Catalog browsing.

use axum::extract::State;

use emporium_core::Validate;

use super::{ApiJson, ApiQuery};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Product, ProductQuery};
use crate::state::AppState;

/// List every product, ordered by id.
pub async fn product_view(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
) -> Result<ApiJson<Vec<Product>>> {
    Ok(ApiJson(state.store().list_products().await?))
}

/// Filter products by name, price range and minimum rating.
pub async fn search(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<ApiJson<Vec<Product>>> {
    query.validate()?;
    let products = state.store().search_products(&query).await?;
    tracing::debug!(results = products.len(), "product search");
    Ok(ApiJson(products))
}
