//! HTTP handlers for the identity service.
//!
//! Registration and login issue the platform credential both as a response
//! and as an HttpOnly cookie. Every authenticated endpoint here also
//! consults the denylist, so a logged-out token is dead even while its
//! signature is still valid.

use crate::AppState;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use shop_auth::{bearer_token, Authenticated};
use shop_storage::StorageError;
use shop_types::{
	Address, AddressBookEntry, ApiError, FullName, Role, User, UserProfile, ValidatedJson,
};
use uuid::Uuid;
use validator::{Validate, ValidationError};

const COOKIE_MAX_AGE_SECONDS: u64 = 24 * 60 * 60;

/// Response envelope for endpoints that return the caller's user record.
#[derive(Debug, Serialize)]
pub struct UserEnvelope {
	pub message: String,
	pub user: UserProfile,
}

/// Response envelope for address book endpoints.
#[derive(Debug, Serialize)]
pub struct AddressesEnvelope {
	pub addresses: Vec<AddressBookEntry>,
}

/// Roles a caller may self-assign at registration. Admin is not one of them.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterRole {
	User,
	Seller,
}

impl From<RegisterRole> for Role {
	fn from(role: RegisterRole) -> Self {
		match role {
			RegisterRole::User => Role::User,
			RegisterRole::Seller => Role::Seller,
		}
	}
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FullNameBody {
	#[validate(length(min = 1, message = "First name cannot be empty"))]
	pub first_name: String,
	#[validate(length(min = 1, message = "Last name cannot be empty"))]
	pub last_name: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
	#[validate(length(min = 3, message = "Username must be at least 3 characters long"))]
	pub username: String,
	#[validate(email(message = "Invalid email address"))]
	pub email: String,
	#[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
	pub password: String,
	#[validate(nested)]
	pub full_name: FullNameBody,
	pub role: Option<RegisterRole>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
	pub username: Option<String>,
	#[validate(email(message = "Invalid email address"))]
	pub email: Option<String>,
	#[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
	pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddAddressRequest {
	#[validate(length(min = 1, message = "Street cannot be empty"))]
	pub street: String,
	#[validate(length(min = 1, message = "City cannot be empty"))]
	pub city: String,
	#[validate(length(min = 1, message = "State cannot be empty"))]
	pub state: String,
	#[validate(length(min = 1, message = "Country cannot be empty"))]
	pub country: String,
	#[serde(alias = "zipCode")]
	#[validate(custom(function = validate_pincode))]
	pub pincode: String,
	#[validate(custom(function = validate_phone))]
	pub phone: String,
	#[serde(default)]
	pub is_default: bool,
}

fn validate_pincode(pincode: &str) -> Result<(), ValidationError> {
	if pincode.len() >= 4 && pincode.bytes().all(|b| b.is_ascii_digit()) {
		return Ok(());
	}
	let mut err = ValidationError::new("pincode");
	err.message = Some("Pincode must be at least 4 digits".into());
	Err(err)
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
	if phone.len() == 10 && phone.bytes().all(|b| b.is_ascii_digit()) {
		return Ok(());
	}
	let mut err = ValidationError::new("phone");
	err.message = Some("Phone must be a valid 10-digit number".into());
	Err(err)
}

fn issue_cookie(token: &str) -> String {
	format!(
		"token={}; HttpOnly; Secure; Path=/; Max-Age={}",
		token, COOKIE_MAX_AGE_SECONDS
	)
}

fn clear_cookie() -> String {
	"token=; HttpOnly; Secure; Path=/; Max-Age=0".to_string()
}

/// Handles `POST /api/auth/register`.
pub async fn register(
	State(state): State<AppState>,
	ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<UserEnvelope>), ApiError> {
	let existing = state
		.users
		.find_by_identifier(Some(&request.username), Some(&request.email))
		.await
		.map_err(storage_error)?;
	if existing.is_some() {
		return Err(ApiError::conflict(
			"USER_EXISTS",
			"Username or email already in use",
		));
	}

	let now = chrono::Utc::now();
	let user = User {
		id: Uuid::new_v4().to_string(),
		username: request.username,
		email: request.email,
		full_name: FullName {
			first_name: request.full_name.first_name,
			last_name: request.full_name.last_name,
		},
		role: request.role.map(Role::from).unwrap_or(Role::User),
		password_hash: state.hasher.hash(&request.password),
		addresses: Vec::new(),
		created_at: now,
		updated_at: now,
	};
	state.users.insert(&user).await.map_err(storage_error)?;

	let token = state.codec.issue(&user.id, &user.username, user.role);
	tracing::info!(user_id = %user.id, "user registered");

	Ok((
		StatusCode::CREATED,
		[(header::SET_COOKIE, issue_cookie(&token))],
		Json(UserEnvelope {
			message: "User registered successfully".to_string(),
			user: UserProfile::from(&user),
		}),
	))
}

/// Handles `POST /api/auth/login`.
pub async fn login(
	State(state): State<AppState>,
	ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<([(header::HeaderName, String); 1], Json<UserEnvelope>), ApiError> {
	if request.username.is_none() && request.email.is_none() {
		return Err(ApiError::validation(
			"IDENTIFIER_REQUIRED",
			"Email or username is required for login",
		));
	}

	let user = state
		.users
		.find_by_identifier(request.username.as_deref(), request.email.as_deref())
		.await
		.map_err(storage_error)?
		.ok_or_else(|| {
			ApiError::unauthorized("INVALID_CREDENTIALS", "Invalid username or email")
		})?;

	if !state.hasher.verify(&request.password, &user.password_hash) {
		return Err(ApiError::unauthorized("INVALID_CREDENTIALS", "Invalid password"));
	}

	let token = state.codec.issue(&user.id, &user.username, user.role);
	Ok((
		[(header::SET_COOKIE, issue_cookie(&token))],
		Json(UserEnvelope {
			message: "Login successful".to_string(),
			user: UserProfile::from(&user),
		}),
	))
}

/// Handles `GET /api/auth/me`.
pub async fn current_user(
	State(state): State<AppState>,
	auth: Authenticated,
) -> Result<Json<UserEnvelope>, ApiError> {
	let user = active_user(&state, &auth).await?;
	Ok(Json(UserEnvelope {
		message: "Current user fetched successfully".to_string(),
		user: UserProfile::from(&user),
	}))
}

/// Handles `GET /api/auth/logout`.
///
/// Lenient on purpose: a missing or invalid token still clears the cookie;
/// a present token is denylisted for the rest of its lifetime.
pub async fn logout(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<([(header::HeaderName, String); 1], Json<serde_json::Value>), ApiError> {
	if let Some(token) = bearer_token(&headers) {
		state
			.denylist
			.revoke(&token)
			.await
			.map_err(storage_error)?;
	}
	Ok((
		[(header::SET_COOKIE, clear_cookie())],
		Json(serde_json::json!({ "message": "Logout successful" })),
	))
}

/// Handles `GET /api/auth/users/me/addresses`.
///
/// Repairs default-address bookkeeping on read: the first entry flagged
/// default wins, extra flags are cleared, and if nothing is flagged the
/// first entry becomes the default. Repairs are persisted.
pub async fn list_addresses(
	State(state): State<AppState>,
	auth: Authenticated,
) -> Result<Json<AddressesEnvelope>, ApiError> {
	let mut user = active_user(&state, &auth).await?;

	if normalize_defaults(&mut user.addresses) {
		user.updated_at = chrono::Utc::now();
		state.users.put(&user).await.map_err(storage_error)?;
	}

	Ok(Json(AddressesEnvelope {
		addresses: user.addresses,
	}))
}

/// Handles `POST /api/auth/users/me/addresses`.
pub async fn add_address(
	State(state): State<AppState>,
	auth: Authenticated,
	ValidatedJson(request): ValidatedJson<AddAddressRequest>,
) -> Result<(StatusCode, Json<AddressesEnvelope>), ApiError> {
	let mut user = active_user(&state, &auth).await?;

	if request.is_default {
		for entry in &mut user.addresses {
			entry.is_default = false;
		}
	}
	user.addresses.push(AddressBookEntry {
		id: Uuid::new_v4().to_string(),
		address: Address {
			street: request.street,
			city: request.city,
			state: request.state,
			country: request.country,
			pincode: request.pincode,
			phone: request.phone,
		},
		is_default: request.is_default,
	});
	user.updated_at = chrono::Utc::now();
	state.users.put(&user).await.map_err(storage_error)?;

	Ok((
		StatusCode::CREATED,
		Json(AddressesEnvelope {
			addresses: user.addresses,
		}),
	))
}

/// Handles `DELETE /api/auth/users/me/addresses/{address_id}`.
pub async fn delete_address(
	State(state): State<AppState>,
	auth: Authenticated,
	Path(address_id): Path<String>,
) -> Result<Json<AddressesEnvelope>, ApiError> {
	let mut user = active_user(&state, &auth).await?;

	let before = user.addresses.len();
	user.addresses.retain(|entry| entry.id != address_id);
	if user.addresses.len() == before {
		return Err(ApiError::not_found("ADDRESS_NOT_FOUND", "Address not found"));
	}

	// Removing the default re-asserts one on the first survivor.
	if !user.addresses.is_empty() && !user.addresses.iter().any(|entry| entry.is_default) {
		user.addresses[0].is_default = true;
	}
	user.updated_at = chrono::Utc::now();
	state.users.put(&user).await.map_err(storage_error)?;

	Ok(Json(AddressesEnvelope {
		addresses: user.addresses,
	}))
}

/// Clears duplicate default flags and asserts one default when none is
/// set. Returns whether anything changed.
fn normalize_defaults(addresses: &mut [AddressBookEntry]) -> bool {
	if addresses.is_empty() {
		return false;
	}

	let mut changed = false;
	let mut default_seen = false;
	for entry in addresses.iter_mut() {
		if entry.is_default {
			if default_seen {
				entry.is_default = false;
				changed = true;
			}
			default_seen = true;
		}
	}
	if !default_seen {
		addresses[0].is_default = true;
		changed = true;
	}
	changed
}

/// Loads the caller's live user record, rejecting revoked tokens.
async fn active_user(state: &AppState, auth: &Authenticated) -> Result<User, ApiError> {
	if state
		.denylist
		.is_revoked(&auth.token)
		.await
		.map_err(storage_error)?
	{
		return Err(ApiError::unauthorized("TOKEN_REVOKED", "Token has been revoked"));
	}

	match state.users.get(auth.user_id()).await {
		Ok(user) => Ok(user),
		Err(StorageError::NotFound) => {
			Err(ApiError::not_found("USER_NOT_FOUND", "User not found"))
		},
		Err(err) => Err(storage_error(err)),
	}
}

fn storage_error(err: StorageError) -> ApiError {
	tracing::error!(error = %err, "identity storage failure");
	ApiError::internal("Identity storage failure")
}
