//! HTTP handlers for the order service.
//!
//! Validation and authorization run at the boundary: request bodies go
//! through [`ValidatedJson`], identity through [`Authenticated`], and role
//! gates fire before any store access. Ownership checks always run before
//! data is returned, and state guards surface 409 rather than mutating a
//! non-PENDING order.

use crate::workflow;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use shop_auth::Authenticated;
use shop_storage::StorageError;
use shop_types::{
	Address, ApiError, Order, OrderStatus, PageMeta, PageQuery, Role, ValidatedJson,
};
use validator::{Validate, ValidationError};

/// Response envelope for single-order endpoints.
#[derive(Debug, Serialize)]
pub struct OrderEnvelope {
	pub order: Order,
}

/// Response envelope for the listing endpoint.
#[derive(Debug, Serialize)]
pub struct OrdersEnvelope {
	pub orders: Vec<Order>,
	pub meta: PageMeta,
}

/// Shipping address as supplied on order creation. All fields are required
/// except the phone number.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddressBody {
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
	pub phone: Option<String>,
}

impl From<ShippingAddressBody> for Address {
	fn from(body: ShippingAddressBody) -> Self {
		Address {
			street: body.street,
			city: body.city,
			state: body.state,
			country: body.country,
			pincode: body.pincode,
			phone: body.phone.unwrap_or_default(),
		}
	}
}

/// Shipping address patch: any present field overwrites the stored one,
/// absent fields keep their prior values.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddressPatchBody {
	#[validate(length(min = 1, message = "Street cannot be empty"))]
	pub street: Option<String>,
	#[validate(length(min = 1, message = "City cannot be empty"))]
	pub city: Option<String>,
	#[validate(length(min = 1, message = "State cannot be empty"))]
	pub state: Option<String>,
	#[validate(length(min = 1, message = "Country cannot be empty"))]
	pub country: Option<String>,
	#[serde(alias = "zipCode")]
	#[validate(custom(function = validate_pincode_opt))]
	pub pincode: Option<String>,
	pub phone: Option<String>,
}

impl AddressPatchBody {
	fn apply_to(&self, address: &mut Address) {
		if let Some(street) = &self.street {
			address.street = street.clone();
		}
		if let Some(city) = &self.city {
			address.city = city.clone();
		}
		if let Some(state) = &self.state {
			address.state = state.clone();
		}
		if let Some(country) = &self.country {
			address.country = country.clone();
		}
		if let Some(pincode) = &self.pincode {
			address.pincode = pincode.clone();
		}
		if let Some(phone) = &self.phone {
			address.phone = phone.clone();
		}
	}
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
	#[validate(nested)]
	pub shipping_address: ShippingAddressBody,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddressRequest {
	#[validate(nested)]
	pub shipping_address: AddressPatchBody,
}

fn validate_pincode(pincode: &str) -> Result<(), ValidationError> {
	if pincode.len() >= 4 && pincode.bytes().all(|b| b.is_ascii_digit()) {
		return Ok(());
	}
	let mut err = ValidationError::new("pincode");
	err.message = Some("Pincode must be at least 4 digits".into());
	Err(err)
}

fn validate_pincode_opt(pincode: &str) -> Result<(), ValidationError> {
	validate_pincode(pincode)
}

/// Handles `POST /api/orders`.
pub async fn create_order(
	State(state): State<AppState>,
	auth: Authenticated,
	ValidatedJson(request): ValidatedJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderEnvelope>), ApiError> {
	auth.require_role(&[Role::User])?;

	let order = workflow::create_order(
		&state.store,
		&state.carts,
		&state.catalog,
		&auth.token,
		auth.user_id(),
		request.shipping_address.into(),
	)
	.await
	.map_err(|err| {
		tracing::warn!(owner = %auth.user_id(), error = %err, "order creation failed");
		ApiError::from(err)
	})?;

	Ok((StatusCode::CREATED, Json(OrderEnvelope { order })))
}

/// Handles `GET /api/orders/me`.
pub async fn list_my_orders(
	State(state): State<AppState>,
	auth: Authenticated,
	Query(query): Query<PageQuery>,
) -> Result<Json<OrdersEnvelope>, ApiError> {
	auth.require_role(&[Role::User])?;

	let page = query.resolve();
	let all = state
		.store
		.list_by_owner(auth.user_id())
		.await
		.map_err(storage_error)?;

	let total = all.len() as u64;
	let orders = all
		.into_iter()
		.skip(page.skip as usize)
		.take(page.limit as usize)
		.collect();

	Ok(Json(OrdersEnvelope {
		orders,
		meta: PageMeta {
			page: page.page,
			limit: page.limit,
			total,
		},
	}))
}

/// Handles `GET /api/orders/{id}`.
///
/// Admins may read any order; users only their own. The not-found check
/// runs first so the two error kinds are the only signal a caller gets
/// about existence versus ownership.
pub async fn get_order(
	State(state): State<AppState>,
	auth: Authenticated,
	Path(order_id): Path<String>,
) -> Result<Json<OrderEnvelope>, ApiError> {
	auth.require_role(&[Role::User, Role::Admin])?;

	let order = load_owned(&state, &order_id, &auth).await?;
	Ok(Json(OrderEnvelope { order }))
}

/// Handles `POST /api/orders/{id}/cancel`.
pub async fn cancel_order(
	State(state): State<AppState>,
	auth: Authenticated,
	Path(order_id): Path<String>,
) -> Result<Json<OrderEnvelope>, ApiError> {
	auth.require_role(&[Role::User])?;

	let snapshot = load_owned(&state, &order_id, &auth).await?;
	require_pending(&snapshot)?;

	let mut updated = snapshot.clone();
	updated.status = OrderStatus::Cancelled;
	updated.updated_at = chrono::Utc::now();

	state
		.store
		.swap_against(&snapshot, &updated)
		.await
		.map_err(storage_error)?;

	tracing::info!(order_id = %updated.id, "order cancelled");
	Ok(Json(OrderEnvelope { order: updated }))
}

/// Handles `PATCH /api/orders/{id}/address`.
pub async fn update_shipping_address(
	State(state): State<AppState>,
	auth: Authenticated,
	Path(order_id): Path<String>,
	ValidatedJson(request): ValidatedJson<UpdateAddressRequest>,
) -> Result<Json<OrderEnvelope>, ApiError> {
	auth.require_role(&[Role::User])?;

	let snapshot = load_owned(&state, &order_id, &auth).await?;
	require_pending(&snapshot)?;

	let mut updated = snapshot.clone();
	request.shipping_address.apply_to(&mut updated.shipping_address);
	updated.updated_at = chrono::Utc::now();

	state
		.store
		.swap_against(&snapshot, &updated)
		.await
		.map_err(storage_error)?;

	Ok(Json(OrderEnvelope { order: updated }))
}

/// Loads an order and enforces the ownership rule shared by every
/// by-id operation.
async fn load_owned(
	state: &AppState,
	order_id: &str,
	auth: &Authenticated,
) -> Result<Order, ApiError> {
	let order = state.store.get(order_id).await.map_err(storage_error)?;
	if order.user != auth.user_id() && auth.claims.role != Role::Admin {
		return Err(ApiError::forbidden(
			"NOT_ORDER_OWNER",
			"Forbidden: you do not own this order",
		));
	}
	Ok(order)
}

fn require_pending(order: &Order) -> Result<(), ApiError> {
	if order.status.is_pending() {
		return Ok(());
	}
	Err(ApiError::conflict(
		"ORDER_NOT_PENDING",
		format!("Order is {} and can no longer be modified", order.status),
	))
}

fn storage_error(err: StorageError) -> ApiError {
	match err {
		StorageError::NotFound => ApiError::not_found("ORDER_NOT_FOUND", "Order not found"),
		// A concurrent request changed the order between our read and
		// write; the caller should re-read and decide again.
		StorageError::PreconditionFailed => ApiError::conflict(
			"ORDER_MODIFIED",
			"Order was modified concurrently; retry with fresh state",
		),
		other => {
			tracing::error!(error = %other, "order storage failure");
			ApiError::internal("Order storage failure")
		},
	}
}
