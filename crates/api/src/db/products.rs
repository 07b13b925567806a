//! Product repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};

use emporium_core::{ProductId, product_ids_to_i32};

use super::RepositoryError;
use crate::models::{NewProduct, Product, ProductQuery};

const PRODUCT_COLUMNS: &str = "id, name, description, price, rating, image, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: String,
    price: Decimal,
    rating: f64,
    image: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            price: r.price,
            rating: r.rating,
            image: r.image,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Escape `LIKE` wildcards so the name filter is a plain substring match.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Load the products among `ids`, ordered by id.
pub(super) async fn fetch_many<'e>(
    executor: impl PgExecutor<'e>,
    ids: &[ProductId],
) -> Result<Vec<Product>, RepositoryError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) ORDER BY id"
    ))
    .bind(product_ids_to_i32(ids))
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(Product::from).collect())
}

/// Repository for catalog operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO products (name, description, price, rating, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(product.name.trim())
        .bind(product.description.trim())
        .bind(product.price)
        .bind(product.rating)
        .bind(product.image.trim())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// List the whole catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Filter the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, query: &ProductQuery) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE ($1::TEXT IS NULL OR name ILIKE '%' || $1 || '%')
              AND ($2::NUMERIC IS NULL OR price >= $2)
              AND ($3::NUMERIC IS NULL OR price <= $3)
              AND ($4::FLOAT8 IS NULL OR rating >= $4)
            ORDER BY id
            "
        ))
        .bind(query.name_filter().map(escape_like))
        .bind(query.min_price)
        .bind(query.max_price)
        .bind(query.min_rating)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Load several products at once.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        fetch_many(self.pool, ids).await
    }
}
