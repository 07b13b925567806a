//! Orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use emporium_core::{
    OrderId, OrderStatus, PaymentMethod, ProductId, UserId, Validate, ValidationErrors, Validator,
};

use super::cart::{Cart, total_for};
use super::product::Product;

/// A placed order. Only `status` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub product_ids: Vec<ProductId>,
    pub total_price: Decimal,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order about to be placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub product_ids: Vec<ProductId>,
    pub total_price: Decimal,
    pub payment_method: PaymentMethod,
}

impl NewOrder {
    /// Price `product_ids` against `catalog` and validate the result.
    ///
    /// # Errors
    ///
    /// Fails when the list is empty or the computed total is not positive.
    pub fn priced(
        user_id: UserId,
        product_ids: Vec<ProductId>,
        payment_method: PaymentMethod,
        catalog: &[Product],
    ) -> Result<Self, ValidationErrors> {
        let order = Self {
            user_id,
            total_price: total_for(&product_ids, catalog),
            product_ids,
            payment_method,
        };
        order.validate()?;
        Ok(order)
    }

    /// Convert a cart into an order, repricing its contents.
    ///
    /// # Errors
    ///
    /// An empty cart fails with a `product_ids` error.
    pub fn from_cart(
        cart: &Cart,
        payment_method: PaymentMethod,
        catalog: &[Product],
    ) -> Result<Self, ValidationErrors> {
        Self::priced(cart.user_id, cart.product_ids.clone(), payment_method, catalog)
    }
}

impl Validate for NewOrder {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .not_empty("product_ids", &self.product_ids)
            .positive("total_price", self.total_price)
            .finish()
    }
}

/// Body of `POST /admin/orders/{id}/status`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
}
