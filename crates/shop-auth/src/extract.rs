//! Verified identity extractor for axum handlers.
//!
//! `Authenticated` pulls the bearer token from the `Authorization` header
//! or the `token` cookie, verifies it against the codec held in router
//! state, and hands the handler both the claims and the raw token (the
//! order workflow forwards the token downstream; logout denylists it).
//! Authorization failures are produced here, before any handler runs.

use crate::token::{Claims, TokenCodec, TokenError};
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts};
use shop_types::{ApiError, Role};
use std::sync::Arc;

/// A verified caller identity.
#[derive(Debug, Clone)]
pub struct Authenticated {
	pub claims: Claims,
	/// The raw presented token, for forwarding or revocation.
	pub token: String,
}

impl Authenticated {
	/// Ensures the caller holds one of the allowed roles.
	pub fn require_role(&self, allowed: &[Role]) -> Result<(), ApiError> {
		if allowed.contains(&self.claims.role) {
			return Ok(());
		}
		Err(ApiError::forbidden(
			"INSUFFICIENT_ROLE",
			"Forbidden: insufficient permissions",
		))
	}

	/// The caller's user id.
	pub fn user_id(&self) -> &str {
		&self.claims.sub
	}
}

impl<S> FromRequestParts<S> for Authenticated
where
	S: Send + Sync,
	Arc<TokenCodec>: FromRef<S>,
{
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
		let codec = Arc::<TokenCodec>::from_ref(state);
		let token = bearer_token(&parts.headers).ok_or_else(|| {
			ApiError::unauthorized("TOKEN_MISSING", "Unauthorized: token not provided")
		})?;

		let claims = codec.verify(&token).map_err(|err| match err {
			TokenError::Expired => ApiError::unauthorized("TOKEN_EXPIRED", "Token expired"),
			TokenError::Malformed | TokenError::InvalidSignature => {
				ApiError::unauthorized("TOKEN_INVALID", "Invalid token")
			},
		})?;

		Ok(Authenticated { claims, token })
	}
}

/// Reads the token from `Authorization: Bearer …` or the `token` cookie.
pub fn bearer_token(headers: &axum::http::HeaderMap) -> Option<String> {
	if let Some(value) = headers.get(header::AUTHORIZATION) {
		if let Ok(value) = value.to_str() {
			if let Some(token) = value.strip_prefix("Bearer ") {
				return Some(token.trim().to_string());
			}
		}
	}

	let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
	cookies.split(';').find_map(|pair| {
		let (name, value) = pair.trim().split_once('=')?;
		(name == "token" && !value.is_empty()).then(|| value.to_string())
	})
}
