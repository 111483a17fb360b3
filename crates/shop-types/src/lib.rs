//! Common types module for the shop platform.
//!
//! This module defines the core data types shared by every service crate:
//! monetary values, addresses, the order/product/cart/user entities, the
//! API error taxonomy, and pagination. Centralizing them keeps the wire
//! representation consistent across all services.

/// API error taxonomy and response envelopes for HTTP endpoints.
pub mod api;
/// Cart entity owned by the cart service.
pub mod cart;
/// Request body validation extractor.
pub mod extract;
/// Monetary values and supported currencies.
pub mod money;
/// Order entity, line items, and the order status lifecycle.
pub mod order;
/// Offset pagination with an enforced page-size ceiling.
pub mod pagination;
/// Product entity owned by the catalog service.
pub mod product;
/// Secure string type for secrets such as the token signing key.
pub mod secret_string;
/// User entity, roles, and postal addresses.
pub mod user;

// Re-export all types for convenient access
pub use api::*;
pub use cart::*;
pub use extract::ValidatedJson;
pub use money::*;
pub use order::*;
pub use pagination::*;
pub use product::*;
pub use secret_string::SecretString;
pub use user::*;
