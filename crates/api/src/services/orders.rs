//! Order placement and lifecycle.

use emporium_core::{OrderId, OrderStatus, PaymentMethod, ProductId, UserId};

use crate::db::{RepositoryError, Store};
use crate::models::{NewOrder, Order};

/// Order operations that need more than a single store call.
pub struct OrderService<'a> {
    store: &'a dyn Store,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Place an order for `product_ids` without touching the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if any product doesn't exist.
    /// Returns `RepositoryError::Invalid` if the list is empty.
    pub async fn instant_buy(
        &self,
        user_id: UserId,
        product_ids: Vec<ProductId>,
        payment_method: PaymentMethod,
    ) -> Result<Order, RepositoryError> {
        let catalog = self.store.find_products(&product_ids).await?;
        if let Some(missing) = product_ids
            .iter()
            .find(|id| !catalog.iter().any(|p| p.id == **id))
        {
            tracing::debug!(product_id = %missing, "instant buy of unknown product");
            return Err(RepositoryError::NotFound);
        }

        let order = NewOrder::priced(user_id, product_ids, payment_method, &catalog)?;
        let order = self.store.create_order(&order).await?;
        tracing::info!(order_id = %order.id, user_id = %user_id, total = %order.total_price, "order placed");
        Ok(order)
    }

    /// Cancel one of the caller's own orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist or
    /// belongs to someone else, `RepositoryError::Conflict` if it can no
    /// longer be canceled.
    pub async fn cancel(&self, user_id: UserId, id: OrderId) -> Result<Order, RepositoryError> {
        let order = self
            .store
            .find_order(id)
            .await?
            .filter(|o| o.user_id == user_id)
            .ok_or(RepositoryError::NotFound)?;

        self.transition(&order, OrderStatus::Canceled).await
    }

    /// Move any order to `status`. Admin only.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist and
    /// `RepositoryError::Conflict` for an illegal transition.
    pub async fn set_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let order = self
            .store
            .find_order(id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        self.transition(&order, status).await
    }

    async fn transition(&self, order: &Order, to: OrderStatus) -> Result<Order, RepositoryError> {
        if !order.status.can_transition_to(to) {
            return Err(RepositoryError::Conflict(format!(
                "cannot move order from {} to {to}",
                order.status
            )));
        }

        let updated = self
            .store
            .update_order_status(order.id, order.status, to)
            .await?;
        tracing::info!(order_id = %order.id, from = %order.status, to = %to, "order status changed");
        Ok(updated)
    }
}
