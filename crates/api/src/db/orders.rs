//! Order repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};

use emporium_core::{
    OrderId, OrderStatus, PaymentMethod, UserId, product_ids_from_i32, product_ids_to_i32,
};

use super::RepositoryError;
use crate::models::{NewOrder, Order};

const ORDER_COLUMNS: &str =
    "id, user_id, product_ids, total_price, payment_method, status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    product_ids: Vec<i32>,
    total_price: Decimal,
    payment_method: PaymentMethod,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(r: OrderRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            product_ids: product_ids_from_i32(r.product_ids),
            total_price: r.total_price,
            payment_method: r.payment_method,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

pub(super) async fn insert_order<'e>(
    executor: impl PgExecutor<'e>,
    order: &NewOrder,
) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r"
        INSERT INTO orders (user_id, product_ids, total_price, payment_method)
        VALUES ($1, $2, $3, $4)
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(order.user_id)
    .bind(product_ids_to_i32(&order.product_ids))
    .bind(order.total_price)
    .bind(order.payment_method)
    .fetch_one(executor)
    .await?;

    Ok(row.into())
}

/// Repository for order operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an already priced order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        insert_order(self.pool, order).await
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Order::from))
    }

    /// Move an order from `from` to `to` if it is still in `from`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Conflict` if its status changed concurrently.
    pub async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE orders SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.into()),
            None => match self.get_by_id(id).await? {
                Some(current) => Err(RepositoryError::Conflict(format!(
                    "order is {}, expected {from}",
                    current.status
                ))),
                None => Err(RepositoryError::NotFound),
            },
        }
    }
}
