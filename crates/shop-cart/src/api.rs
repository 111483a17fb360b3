//! HTTP handlers for the cart service.

use crate::AppState;
use axum::extract::{Path, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use shop_auth::Authenticated;
use shop_storage::StorageError;
use shop_types::{ApiError, Cart, CartItem, CartView, Role, ValidatedJson};
use validator::Validate;

/// Response envelope for cart endpoints.
#[derive(Debug, Serialize)]
pub struct CartEnvelope {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	pub cart: CartView,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
	#[validate(length(min = 1, message = "productId is required"))]
	pub product_id: String,
	#[validate(range(min = 1, message = "Quantity must be greater than zero"))]
	pub quantity: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemRequest {
	#[validate(range(min = 1, message = "Quantity must be greater than zero"))]
	pub quantity: u32,
}

/// Handles `GET /api/cart`.
///
/// First access creates and persists an empty cart, so every later read
/// and mutation starts from an existing record.
pub async fn get_cart(
	State(state): State<AppState>,
	auth: Authenticated,
) -> Result<Json<CartEnvelope>, ApiError> {
	auth.require_role(&[Role::User])?;

	let cart = match state.store.get(auth.user_id()).await.map_err(storage_error)? {
		Some(cart) => cart,
		None => {
			let cart = Cart::empty(auth.user_id(), chrono::Utc::now());
			state.store.put(&cart).await.map_err(storage_error)?;
			cart
		},
	};

	Ok(Json(CartEnvelope {
		message: None,
		cart: cart.view(),
	}))
}

/// Handles `POST /api/cart/items`.
///
/// Adding a product already in the cart merges quantities instead of
/// duplicating the line.
pub async fn add_item(
	State(state): State<AppState>,
	auth: Authenticated,
	ValidatedJson(request): ValidatedJson<AddItemRequest>,
) -> Result<Json<CartEnvelope>, ApiError> {
	auth.require_role(&[Role::User])?;

	let mut cart = state
		.store
		.get(auth.user_id())
		.await
		.map_err(storage_error)?
		.unwrap_or_else(|| Cart::empty(auth.user_id(), chrono::Utc::now()));

	match cart
		.items
		.iter_mut()
		.find(|item| item.product_id == request.product_id)
	{
		Some(item) => item.quantity = item.quantity.saturating_add(request.quantity),
		None => cart.items.push(CartItem {
			product_id: request.product_id,
			quantity: request.quantity,
		}),
	}
	cart.updated_at = chrono::Utc::now();
	state.store.put(&cart).await.map_err(storage_error)?;

	Ok(Json(CartEnvelope {
		message: Some("Item added to cart successfully".to_string()),
		cart: cart.view(),
	}))
}

/// Handles `PATCH /api/cart/items/{product_id}`.
pub async fn update_item(
	State(state): State<AppState>,
	auth: Authenticated,
	Path(product_id): Path<String>,
	ValidatedJson(request): ValidatedJson<UpdateItemRequest>,
) -> Result<Json<CartEnvelope>, ApiError> {
	auth.require_role(&[Role::User])?;

	let mut cart = state
		.store
		.get(auth.user_id())
		.await
		.map_err(storage_error)?
		.ok_or_else(|| ApiError::not_found("CART_NOT_FOUND", "Cart not found"))?;

	let item = cart
		.items
		.iter_mut()
		.find(|item| item.product_id == product_id)
		.ok_or_else(|| ApiError::not_found("ITEM_NOT_FOUND", "Item not found in cart"))?;

	item.quantity = request.quantity;
	cart.updated_at = chrono::Utc::now();
	state.store.put(&cart).await.map_err(storage_error)?;

	Ok(Json(CartEnvelope {
		message: Some("Cart updated".to_string()),
		cart: cart.view(),
	}))
}

fn storage_error(err: StorageError) -> ApiError {
	tracing::error!(error = %err, "cart storage failure");
	ApiError::internal("Cart storage failure")
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::CartStore;
	use crate::{router, AppState};
	use axum::body::{to_bytes, Body};
	use axum::http::{Request, StatusCode};
	use serde_json::{json, Value};
	use shop_auth::TokenCodec;
	use shop_storage::{MemoryStorage, StorageService};
	use shop_types::SecretString;
	use std::sync::Arc;
	use std::time::Duration;
	use tower::ServiceExt;

	struct TestApp {
		app: axum::Router,
		codec: Arc<TokenCodec>,
	}

	fn test_app() -> TestApp {
		let codec = Arc::new(TokenCodec::new(
			SecretString::from("cart-test-secret"),
			Duration::from_secs(3600),
		));
		let state = AppState {
			store: Arc::new(CartStore::new(StorageService::new(Box::new(
				MemoryStorage::new(),
			)))),
			codec: codec.clone(),
		};
		TestApp {
			app: router(state),
			codec,
		}
	}

	impl TestApp {
		fn token(&self, user: &str) -> String {
			self.codec.issue(user, user, Role::User)
		}

		async fn request(
			&self,
			method: &str,
			uri: &str,
			token: &str,
			body: Option<Value>,
		) -> (StatusCode, Value) {
			let mut builder = Request::builder()
				.method(method)
				.uri(uri)
				.header("authorization", format!("Bearer {}", token));
			let body = match body {
				Some(value) => {
					builder = builder.header("content-type", "application/json");
					Body::from(value.to_string())
				},
				None => Body::empty(),
			};
			let response = self
				.app
				.clone()
				.oneshot(builder.body(body).unwrap())
				.await
				.unwrap();
			let status = response.status();
			let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
			let value = if bytes.is_empty() {
				Value::Null
			} else {
				serde_json::from_slice(&bytes).unwrap()
			};
			(status, value)
		}
	}

	#[tokio::test]
	async fn first_read_creates_empty_cart() {
		let app = test_app();
		let token = app.token("u-1");

		let (status, body) = app.request("GET", "/api/cart", &token, None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["cart"]["items"].as_array().unwrap().len(), 0);
		assert_eq!(body["cart"]["totals"]["itemCount"], 0);
		assert_eq!(body["cart"]["totals"]["totalQuantity"], 0);
	}

	#[tokio::test]
	async fn adding_same_product_merges_quantities() {
		let app = test_app();
		let token = app.token("u-1");

		let (status, _) = app
			.request(
				"POST",
				"/api/cart/items",
				&token,
				Some(json!({"productId": "p1", "quantity": 2})),
			)
			.await;
		assert_eq!(status, StatusCode::OK);

		let (_, body) = app
			.request(
				"POST",
				"/api/cart/items",
				&token,
				Some(json!({"productId": "p1", "quantity": 3})),
			)
			.await;

		let items = body["cart"]["items"].as_array().unwrap();
		assert_eq!(items.len(), 1);
		assert_eq!(items[0]["quantity"], 5);
		assert_eq!(body["cart"]["totals"]["totalQuantity"], 5);
	}

	#[tokio::test]
	async fn zero_quantity_is_rejected() {
		let app = test_app();
		let token = app.token("u-1");

		let (status, _) = app
			.request(
				"POST",
				"/api/cart/items",
				&token,
				Some(json!({"productId": "p1", "quantity": 0})),
			)
			.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn update_replaces_quantity() {
		let app = test_app();
		let token = app.token("u-1");

		app.request(
			"POST",
			"/api/cart/items",
			&token,
			Some(json!({"productId": "p1", "quantity": 2})),
		)
		.await;

		let (status, body) = app
			.request(
				"PATCH",
				"/api/cart/items/p1",
				&token,
				Some(json!({"quantity": 7})),
			)
			.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["cart"]["items"][0]["quantity"], 7);
	}

	#[tokio::test]
	async fn update_unknown_item_is_not_found() {
		let app = test_app();
		let token = app.token("u-1");

		// No cart at all yet.
		let (status, body) = app
			.request(
				"PATCH",
				"/api/cart/items/p1",
				&token,
				Some(json!({"quantity": 1})),
			)
			.await;
		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(body["error"], "CART_NOT_FOUND");

		// Cart exists but the line does not.
		app.request("GET", "/api/cart", &token, None).await;
		let (status, body) = app
			.request(
				"PATCH",
				"/api/cart/items/p1",
				&token,
				Some(json!({"quantity": 1})),
			)
			.await;
		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(body["error"], "ITEM_NOT_FOUND");
	}

	#[tokio::test]
	async fn carts_are_per_user() {
		let app = test_app();
		let alice = app.token("u-1");
		let bob = app.token("u-2");

		app.request(
			"POST",
			"/api/cart/items",
			&alice,
			Some(json!({"productId": "p1", "quantity": 2})),
		)
		.await;

		let (_, body) = app.request("GET", "/api/cart", &bob, None).await;
		assert_eq!(body["cart"]["items"].as_array().unwrap().len(), 0);
	}

	#[tokio::test]
	async fn missing_token_is_unauthorized() {
		let app = test_app();
		let request = Request::builder()
			.method("GET")
			.uri("/api/cart")
			.body(Body::empty())
			.unwrap();
		let response = app.app.clone().oneshot(request).await.unwrap();
		assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	}
}
