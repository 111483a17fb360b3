//! API error taxonomy for the shop platform HTTP surface.
//!
//! Every service maps its failures onto this one taxonomy so that each kind
//! has a stable HTTP status and a machine-readable error code. Validation and
//! authorization failures are produced at the boundary and never reach the
//! workflow bodies; upstream failures are retryable by the caller and never
//! leave partial state behind.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Error payload returned by every endpoint on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Machine-readable error code, stable across releases.
	pub error: String,
	/// Human-readable description.
	pub message: String,
	/// Additional error context.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Value>,
}

/// Structured API error with a stable HTTP status per kind.
#[derive(Debug, Clone)]
pub enum ApiError {
	/// Missing or invalid credential (401).
	Unauthorized { code: String, message: String },
	/// Valid credential but insufficient role or not the resource owner (403).
	Forbidden { code: String, message: String },
	/// Resource or product absent (404).
	NotFound { code: String, message: String },
	/// Stock insufficient or state-incompatible operation (409).
	Conflict {
		code: String,
		message: String,
		details: Option<Value>,
	},
	/// Malformed request body or parameters (400).
	Validation {
		code: String,
		message: String,
		details: Option<Value>,
	},
	/// A downstream service call failed or timed out (502, retryable by caller).
	Upstream { code: String, message: String },
	/// Unexpected failure (500).
	Internal { message: String },
}

impl ApiError {
	pub fn unauthorized(code: &str, message: impl Into<String>) -> Self {
		Self::Unauthorized {
			code: code.to_string(),
			message: message.into(),
		}
	}

	pub fn forbidden(code: &str, message: impl Into<String>) -> Self {
		Self::Forbidden {
			code: code.to_string(),
			message: message.into(),
		}
	}

	pub fn not_found(code: &str, message: impl Into<String>) -> Self {
		Self::NotFound {
			code: code.to_string(),
			message: message.into(),
		}
	}

	pub fn conflict(code: &str, message: impl Into<String>) -> Self {
		Self::Conflict {
			code: code.to_string(),
			message: message.into(),
			details: None,
		}
	}

	pub fn conflict_with(code: &str, message: impl Into<String>, details: Value) -> Self {
		Self::Conflict {
			code: code.to_string(),
			message: message.into(),
			details: Some(details),
		}
	}

	pub fn validation(code: &str, message: impl Into<String>) -> Self {
		Self::Validation {
			code: code.to_string(),
			message: message.into(),
			details: None,
		}
	}

	pub fn validation_with(code: &str, message: impl Into<String>, details: Value) -> Self {
		Self::Validation {
			code: code.to_string(),
			message: message.into(),
			details: Some(details),
		}
	}

	pub fn upstream(code: &str, message: impl Into<String>) -> Self {
		Self::Upstream {
			code: code.to_string(),
			message: message.into(),
		}
	}

	pub fn internal(message: impl Into<String>) -> Self {
		Self::Internal {
			message: message.into(),
		}
	}

	/// HTTP status code for this error kind.
	pub fn status_code(&self) -> u16 {
		match self {
			ApiError::Unauthorized { .. } => 401,
			ApiError::Forbidden { .. } => 403,
			ApiError::NotFound { .. } => 404,
			ApiError::Conflict { .. } => 409,
			ApiError::Validation { .. } => 400,
			ApiError::Upstream { .. } => 502,
			ApiError::Internal { .. } => 500,
		}
	}

	/// Converts to the wire payload.
	pub fn to_error_response(&self) -> ErrorResponse {
		match self {
			ApiError::Unauthorized { code, message }
			| ApiError::Forbidden { code, message }
			| ApiError::NotFound { code, message }
			| ApiError::Upstream { code, message } => ErrorResponse {
				error: code.clone(),
				message: message.clone(),
				details: None,
			},
			ApiError::Conflict {
				code,
				message,
				details,
			}
			| ApiError::Validation {
				code,
				message,
				details,
			} => ErrorResponse {
				error: code.clone(),
				message: message.clone(),
				details: details.clone(),
			},
			ApiError::Internal { message } => ErrorResponse {
				error: "INTERNAL_ERROR".to_string(),
				message: message.clone(),
				details: None,
			},
		}
	}
}

impl fmt::Display for ApiError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let payload = self.to_error_response();
		write!(f, "{} ({}): {}", self.status_code(), payload.error, payload.message)
	}
}

impl std::error::Error for ApiError {}

impl axum::response::IntoResponse for ApiError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status, Json(self.to_error_response())).into_response()
	}
}
