//! Storage collaborator.
//!
//! Handlers never talk to a database directly. They receive an
//! `Arc<dyn Store>` through the application state, created once at startup.
//!
//! # Implementations
//!
//! - [`PgStore`] - `PostgreSQL` via sqlx, used by the server binary
//! - [`MemoryStore`] - in-process maps, used by tests and local runs
//!
//! # Tables
//!
//! - `users` - credentials, role and last issued tokens
//! - `addresses` - one postal address per user
//! - `products` - the catalog
//! - `carts` - one cart per user, product ids as `INTEGER[]`
//! - `orders` - placed orders
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p emporium-cli -- migrate
//! ```

pub mod carts;
pub mod memory;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use emporium_core::{
    OrderId, OrderStatus, PaymentMethod, ProductId, Role, UserId, ValidationErrors,
};

use crate::models::{Cart, NewOrder, NewProduct, NewUser, Order, Product, ProductQuery, User};

pub use carts::CartRepository;
pub use memory::MemoryStore;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email) or a lost status race.
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The entity built inside the store failed its own rules.
    #[error("invalid: {0}")]
    Invalid(#[from] ValidationErrors),
}

/// Everything the handlers need from persistent storage.
///
/// Cart mutations and checkout are atomic per user. Status updates are
/// compare-and-set: they fail with [`RepositoryError::Conflict`] when the
/// stored status is no longer `from`.
#[async_trait]
pub trait Store: Send + Sync {
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Insert a user and their address.
    ///
    /// Fails with `Conflict` naming `username` or `email` on duplicates.
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError>;

    async fn find_user_by_username(&self, username: &str)
    -> Result<Option<User>, RepositoryError>;

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Persist the latest issued token pair. `None` clears a token.
    async fn update_tokens(
        &self,
        id: UserId,
        token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<(), RepositoryError>;

    async fn set_user_role(&self, username: &str, role: Role) -> Result<User, RepositoryError>;

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError>;

    /// All products ordered by id.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Products passing every filter in `query`, ordered by id.
    async fn search_products(&self, query: &ProductQuery)
    -> Result<Vec<Product>, RepositoryError>;

    /// The distinct products among `ids`. Unknown ids are skipped.
    async fn find_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    async fn find_cart(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError>;

    /// Append `product_id` to the user's cart, creating the cart if needed.
    ///
    /// Fails with `NotFound` when the product does not exist.
    async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Cart, RepositoryError>;

    /// Remove one occurrence of `product_id`.
    ///
    /// Fails with `NotFound` when the cart does not hold it.
    async fn remove_from_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Cart, RepositoryError>;

    /// Turn the cart into an order and empty it.
    ///
    /// Fails with `Invalid` when the cart is empty.
    async fn checkout_cart(
        &self,
        user_id: UserId,
        payment_method: PaymentMethod,
    ) -> Result<Order, RepositoryError>;

    async fn create_order(&self, order: &NewOrder) -> Result<Order, RepositoryError>;

    /// The user's orders, newest first.
    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    async fn update_order_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// [`Store`] backed by `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        UserRepository::new(&self.pool).create(user).await
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool).get_by_username(username).await
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool).get_by_id(id).await
    }

    async fn update_tokens(
        &self,
        id: UserId,
        token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<(), RepositoryError> {
        UserRepository::new(&self.pool)
            .update_tokens(id, token, refresh_token)
            .await
    }

    async fn set_user_role(&self, username: &str, role: Role) -> Result<User, RepositoryError> {
        UserRepository::new(&self.pool).set_role(username, role).await
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        ProductRepository::new(&self.pool).create(product).await
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).list().await
    }

    async fn search_products(
        &self,
        query: &ProductQuery,
    ) -> Result<Vec<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).search(query).await
    }

    async fn find_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).get_many(ids).await
    }

    async fn find_cart(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        CartRepository::new(&self.pool).get_by_user(user_id).await
    }

    async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Cart, RepositoryError> {
        CartRepository::new(&self.pool).add(user_id, product_id).await
    }

    async fn remove_from_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Cart, RepositoryError> {
        CartRepository::new(&self.pool).remove(user_id, product_id).await
    }

    async fn checkout_cart(
        &self,
        user_id: UserId,
        payment_method: PaymentMethod,
    ) -> Result<Order, RepositoryError> {
        CartRepository::new(&self.pool)
            .checkout(user_id, payment_method)
            .await
    }

    async fn create_order(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        OrderRepository::new(&self.pool).create(order).await
    }

    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        OrderRepository::new(&self.pool).list_for_user(user_id).await
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(&self.pool).get_by_id(id).await
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        OrderRepository::new(&self.pool)
            .update_status(id, from, to)
            .await
    }
}
