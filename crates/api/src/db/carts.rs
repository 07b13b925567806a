//! Cart repository.
//!
//! Every mutation runs in one transaction holding the cart row lock
//! (`SELECT ... FOR UPDATE`), so concurrent requests for the same user
//! serialize instead of losing updates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use emporium_core::{
    CartId, PaymentMethod, ProductId, UserId, Validate, product_ids_from_i32, product_ids_to_i32,
};

use super::RepositoryError;
use super::orders::insert_order;
use super::products::fetch_many;
use crate::models::{Cart, NewOrder, Order};

const CART_COLUMNS: &str = "id, user_id, product_ids, total_price, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    product_ids: Vec<i32>,
    total_price: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(r: CartRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            product_ids: product_ids_from_i32(r.product_ids),
            total_price: r.total_price,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Load the user's cart, creating it if needed, and lock the row.
async fn lock_cart(conn: &mut PgConnection, user_id: UserId) -> Result<Cart, RepositoryError> {
    sqlx::query("INSERT INTO carts (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    let row = sqlx::query_as::<_, CartRow>(&format!(
        "SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1 FOR UPDATE"
    ))
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.into())
}

/// Write back contents and a total recomputed from current prices.
async fn save_cart(conn: &mut PgConnection, mut cart: Cart) -> Result<Cart, RepositoryError> {
    let catalog = fetch_many(&mut *conn, &cart.product_ids).await?;
    cart.recompute_total(&catalog);
    cart.validate()?;

    let row = sqlx::query_as::<_, CartRow>(&format!(
        r"
        UPDATE carts
        SET product_ids = $2, total_price = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING {CART_COLUMNS}
        "
    ))
    .bind(cart.id)
    .bind(product_ids_to_i32(&cart.product_ids))
    .bind(cart.total_price)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.into())
}

/// Repository for cart operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's cart, if one was ever created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(&format!(
            "SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Cart::from))
    }

    /// Append a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn add(&self, user_id: UserId, product_id: ProductId) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
            .bind(product_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(RepositoryError::NotFound);
        }

        let mut cart = lock_cart(&mut tx, user_id).await?;
        cart.product_ids.push(product_id);
        let cart = save_cart(&mut tx, cart).await?;

        tx.commit().await?;
        Ok(cart)
    }

    /// Remove one occurrence of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart doesn't hold the product.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let mut cart = lock_cart(&mut tx, user_id).await?;
        if !cart.remove_one(product_id) {
            return Err(RepositoryError::NotFound);
        }
        let cart = save_cart(&mut tx, cart).await?;

        tx.commit().await?;
        Ok(cart)
    }

    /// Convert the cart into an order and empty it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the cart is empty.
    pub async fn checkout(
        &self,
        user_id: UserId,
        payment_method: PaymentMethod,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let mut cart = lock_cart(&mut tx, user_id).await?;
        let catalog = fetch_many(&mut *tx, &cart.product_ids).await?;
        let order = NewOrder::from_cart(&cart, payment_method, &catalog)?;
        let order = insert_order(&mut *tx, &order).await?;

        cart.product_ids.clear();
        save_cart(&mut tx, cart).await?;

        tx.commit().await?;
        Ok(order)
    }
}
