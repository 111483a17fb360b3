//! Authentication primitives for the shop platform.
//!
//! Provides the HS256 bearer-token codec shared by every service, the
//! password hashing used by the identity service, and the axum extractor
//! that turns a bearer token (header or cookie) into verified claims at the
//! HTTP boundary. The signing secret is injected from configuration at
//! process start; nothing in this crate reads the environment.

/// Verified identity extractor and role gating.
pub mod extract;
/// Salted, iterated password hashing.
pub mod password;
/// HS256 token issuance and verification.
pub mod token;

pub use extract::{bearer_token, Authenticated};
pub use password::PasswordHasher;
pub use token::{Claims, TokenCodec, TokenError};
