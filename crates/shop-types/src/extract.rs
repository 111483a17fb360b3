//! Request body validation extractor.
//!
//! `ValidatedJson<T>` deserializes the JSON body and runs the `validator`
//! derive rules on it before the handler executes, so malformed input is
//! rejected at the boundary with a `Validation` error and never reaches a
//! workflow body.

use crate::ApiError;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON extractor that also applies `validator` rules.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
	S: Send + Sync,
	T: DeserializeOwned + Validate,
{
	type Rejection = ApiError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let axum::Json(value) = axum::Json::<T>::from_request(req, state)
			.await
			.map_err(|err| {
				ApiError::validation("INVALID_BODY", format!("Invalid request body: {}", err))
			})?;

		value.validate().map_err(|errors| {
			let details = serde_json::to_value(&errors).unwrap_or_default();
			ApiError::validation_with("VALIDATION_FAILED", "Request validation failed", details)
		})?;

		Ok(ValidatedJson(value))
	}
}
