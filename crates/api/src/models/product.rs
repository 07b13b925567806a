//! Catalog products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use emporium_core::{ProductId, Validate, ValidationErrors, Validator};

/// Maximum product name length.
pub const MAX_NAME_LENGTH: usize = 200;

/// Prices are stored as `NUMERIC(12, 2)`.
pub const PRICE_PRECISION: u32 = 12;
pub const PRICE_SCALE: u32 = 2;

/// Highest rating a product can carry.
pub const MAX_RATING: f64 = 5.0;

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub rating: f64,
    /// Absolute URL of the product image.
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a product.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub rating: f64,
    pub image: String,
}

impl Validate for NewProduct {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .required("name", &self.name)
            .max_length("name", &self.name, MAX_NAME_LENGTH)
            .required("description", &self.description)
            .positive("price", self.price)
            .money("price", self.price, PRICE_PRECISION, PRICE_SCALE)
            .range("rating", self.rating, 0.0, MAX_RATING)
            .required("image", &self.image)
            .url("image", &self.image)
            .finish()
    }
}

/// Search filters for `GET /users/search`. Every filter is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductQuery {
    /// Case-insensitive substring of the product name.
    pub name: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_rating: Option<f64>,
}

impl ProductQuery {
    /// The name filter, trimmed, or `None` when blank.
    #[must_use]
    pub fn name_filter(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }

    /// Whether `product` passes every filter that is set.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let name_ok = self.name_filter().is_none_or(|needle| {
            product
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase())
        });
        name_ok
            && self.min_price.is_none_or(|min| product.price >= min)
            && self.max_price.is_none_or(|max| product.price <= max)
            && self.min_rating.is_none_or(|min| product.rating >= min)
    }
}

impl Validate for ProductQuery {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        if let Some(min) = self.min_price {
            v.non_negative("min_price", min);
        }
        if let Some(max) = self.max_price {
            v.non_negative("max_price", max);
            if self.min_price.is_some_and(|min| min > max) {
                v.rule("max_price", false, "must not be less than min_price");
            }
        }
        if let Some(rating) = self.min_rating {
            v.range("min_rating", rating, 0.0, MAX_RATING);
        }
        v.finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(name: &str, price: i64, rating: f64) -> Product {
        Product {
            id: ProductId::new(1),
            name: name.to_owned(),
            description: "A thing".to_owned(),
            price: Decimal::new(price, 2),
            rating,
            image: "https://cdn.example.com/p.png".to_owned(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn valid_product() -> NewProduct {
        NewProduct {
            name: "Kettle".to_owned(),
            description: "Boils water".to_owned(),
            price: Decimal::new(2999, 2),
            rating: 4.5,
            image: "https://cdn.example.com/kettle.png".to_owned(),
        }
    }

    #[test]
    fn test_valid_product() {
        assert!(valid_product().validate().is_ok());
    }

    #[test]
    fn test_price_must_be_positive() {
        let mut p = valid_product();
        p.price = Decimal::ZERO;
        assert_eq!(p.validate().unwrap_err().first().field, "price");
    }

    #[test]
    fn test_price_must_fit_storage() {
        let mut p = valid_product();
        p.price = Decimal::new(1, 3);
        assert_eq!(p.validate().unwrap_err().first().field, "price");

        p.price = Decimal::new(1_000_000_000_000, 0);
        assert_eq!(p.validate().unwrap_err().first().field, "price");

        p.price = Decimal::new(999_999_999_999, 2);
        assert!(p.validate().is_ok());

        p.price = Decimal::new(1_500, 3);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_rating_bounds() {
        let mut p = valid_product();
        p.rating = 5.0;
        assert!(p.validate().is_ok());
        p.rating = -0.1;
        assert_eq!(p.validate().unwrap_err().first().field, "rating");
    }

    #[test]
    fn test_image_must_be_url() {
        let mut p = valid_product();
        p.image = "kettle.png".to_owned();
        let err = p.validate().unwrap_err();
        assert_eq!(err.first().field, "image");
        assert_eq!(err.first().message, "must be a valid http(s) URL");
    }

    #[test]
    fn test_query_matches_name_case_insensitively() {
        let query = ProductQuery {
            name: Some("KETT".to_owned()),
            ..ProductQuery::default()
        };
        assert!(query.matches(&product("Electric kettle", 100, 3.0)));
        assert!(!query.matches(&product("Toaster", 100, 3.0)));
    }

    #[test]
    fn test_query_price_and_rating_filters() {
        let query = ProductQuery {
            min_price: Some(Decimal::new(500, 2)),
            max_price: Some(Decimal::new(1000, 2)),
            min_rating: Some(4.0),
            ..ProductQuery::default()
        };
        assert!(query.matches(&product("a", 500, 4.0)));
        assert!(!query.matches(&product("b", 499, 4.5)));
        assert!(!query.matches(&product("c", 1001, 4.5)));
        assert!(!query.matches(&product("d", 700, 3.9)));
    }

    #[test]
    fn test_blank_name_filter_is_ignored() {
        let query = ProductQuery {
            name: Some("  ".to_owned()),
            ..ProductQuery::default()
        };
        assert_eq!(query.name_filter(), None);
        assert!(query.matches(&product("anything", 1, 0.0)));
    }

    #[test]
    fn test_query_rejects_inverted_price_range() {
        let query = ProductQuery {
            min_price: Some(Decimal::TEN),
            max_price: Some(Decimal::ONE),
            ..ProductQuery::default()
        };
        assert_eq!(query.validate().unwrap_err().first().field, "max_price");
    }
}
