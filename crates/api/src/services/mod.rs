//! Business logic services.
//!
//! # Services
//!
//! - `auth` - credential manager, token issuer/verifier, signup and login
//! - `orders` - instant buy, cancellation and status changes

pub mod auth;
pub mod orders;

pub use orders::OrderService;
