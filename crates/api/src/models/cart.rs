//! Shopping carts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use emporium_core::{CartId, PaymentMethod, ProductId, UserId, Validate, ValidationErrors, Validator};

use super::product::Product;

/// A user's cart. Duplicate ids in `product_ids` represent quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub product_ids: Vec<ProductId>,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// An empty, not yet persisted cart for `user_id`.
    ///
    /// Used as the response for users that never added anything.
    #[must_use]
    pub fn empty(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: CartId::new(0),
            user_id,
            product_ids: Vec::new(),
            total_price: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.product_ids.is_empty()
    }

    /// Remove one occurrence of `product_id`. Returns whether it was present.
    pub fn remove_one(&mut self, product_id: ProductId) -> bool {
        match self.product_ids.iter().position(|id| *id == product_id) {
            Some(index) => {
                self.product_ids.remove(index);
                true
            }
            None => false,
        }
    }

    /// Recompute `total_price` from current catalog prices.
    ///
    /// Ids missing from `catalog` (deleted products) contribute nothing.
    pub fn recompute_total(&mut self, catalog: &[Product]) {
        self.total_price = total_for(&self.product_ids, catalog);
    }
}

impl Validate for Cart {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .non_negative("total_price", self.total_price)
            .finish()
    }
}

/// Sum the prices of `ids` looked up in `catalog`, counting duplicates.
#[must_use]
pub fn total_for(ids: &[ProductId], catalog: &[Product]) -> Decimal {
    ids.iter()
        .filter_map(|id| catalog.iter().find(|p| p.id == *id))
        .map(|p| p.price)
        .sum()
}

/// Body of `POST /cart/add_to_cart` and `POST /cart/remove_item`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CartItemRequest {
    pub product_id: ProductId,
}

/// Body of `POST /cart/cart_checkout`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
}

/// Body of `POST /cart/instant_buy`.
#[derive(Debug, Clone, Deserialize)]
pub struct InstantBuyRequest {
    #[serde(default)]
    pub product_ids: Vec<ProductId>,
    pub payment_method: PaymentMethod,
}
