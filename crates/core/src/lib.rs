//! Emporium Core - Shared types library.
//!
//! This crate provides common types used across all Emporium components:
//! - `api` - The HTTP backend (users, catalog, carts, orders)
//! - `cli` - Command-line tools for migrations and user management
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, roles, and statuses
//! - [`validation`] - Field-level validation rules for request entities

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::{FieldError, Validate, ValidationErrors, Validator};
