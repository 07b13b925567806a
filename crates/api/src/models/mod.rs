//! Domain models for the API.
//!
//! Request payloads that become stored entities implement
//! [`emporium_core::Validate`]; stored entities are read back from the
//! storage collaborator and serialized in responses.

pub mod cart;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use cart::{Cart, CartItemRequest, CheckoutRequest, InstantBuyRequest};
pub use order::{NewOrder, Order, StatusUpdateRequest};
pub use product::{NewProduct, Product, ProductQuery};
pub use session::CurrentUser;
pub use user::{Address, AddressInput, LoginRequest, NewUser, SignupRequest, User, UserProfile};
