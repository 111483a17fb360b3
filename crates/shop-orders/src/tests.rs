//! End-to-end tests for the order service.
//!
//! The cart and catalog services are stubbed as real axum servers on
//! ephemeral ports so the workflow exercises its actual HTTP clients; the
//! order router itself is driven through `tower::ServiceExt::oneshot`.

use crate::store::OrderStore;
use crate::{router, AppState};
use axum::body::{to_bytes, Body};
use axum::extract::Path as AxumPath;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use shop_auth::TokenCodec;
use shop_clients::{build_http_client, CartClient, CatalogClient};
use shop_storage::{MemoryStorage, StorageService};
use shop_types::{CartItem, Currency, Money, Product, Role, SecretString};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const TEST_SECRET: &str = "orders-test-secret";

struct TestApp {
	app: Router,
	store: Arc<OrderStore>,
	codec: Arc<TokenCodec>,
}

impl TestApp {
	fn token(&self, user_id: &str, role: Role) -> String {
		self.codec.issue(user_id, user_id, role)
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

async fn spawn(router: Router) -> String {
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, router).await.unwrap();
	});
	format!("http://{}", addr)
}

fn stub_cart(items: Vec<CartItem>) -> Router {
	let item_count = items.len() as u64;
	let total_quantity: u64 = items.iter().map(|i| u64::from(i.quantity)).sum();
	Router::new().route(
		"/api/cart",
		get(move || {
			let items = items.clone();
			async move {
				Json(json!({
					"cart": {
						"items": items,
						"totals": {
							"itemCount": item_count,
							"totalQuantity": total_quantity,
						},
					},
				}))
			}
		}),
	)
}

fn stub_catalog(products: Vec<Product>) -> Router {
	let by_id: Arc<HashMap<String, Product>> = Arc::new(
		products
			.into_iter()
			.map(|product| (product.id.clone(), product))
			.collect(),
	);
	Router::new().route(
		"/api/products/{id}",
		get(move |AxumPath(id): AxumPath<String>| {
			let by_id = by_id.clone();
			async move {
				match by_id.get(&id) {
					Some(product) => Json(json!({ "data": product })).into_response(),
					None => (
						StatusCode::NOT_FOUND,
						Json(json!({ "message": "Product not found" })),
					)
						.into_response(),
				}
			}
		}),
	)
}

fn product(id: &str, amount: i64, currency: Currency, stock: u32) -> Product {
	Product {
		id: id.to_string(),
		title: format!("Product {}", id),
		description: String::new(),
		price: Money::new(Decimal::from(amount), currency),
		seller: "s-1".into(),
		stock,
		created_at: Utc::now(),
		updated_at: Utc::now(),
	}
}

fn cart_line(product_id: &str, quantity: u32) -> CartItem {
	CartItem {
		product_id: product_id.to_string(),
		quantity,
	}
}

async fn test_app(cart_items: Vec<CartItem>, products: Vec<Product>) -> TestApp {
	let cart_url = spawn(stub_cart(cart_items)).await;
	let catalog_url = spawn(stub_catalog(products)).await;
	test_app_with_urls(cart_url, catalog_url)
}

fn test_app_with_urls(cart_url: String, catalog_url: String) -> TestApp {
	let store = Arc::new(OrderStore::new(StorageService::new(Box::new(
		MemoryStorage::new(),
	))));
	let codec = Arc::new(TokenCodec::new(
		SecretString::from(TEST_SECRET),
		Duration::from_secs(3600),
	));
	let http = build_http_client(Duration::from_secs(2)).unwrap();

	let state = AppState {
		store: store.clone(),
		codec: codec.clone(),
		carts: CartClient::new(http.clone(), cart_url),
		catalog: CatalogClient::new(http, catalog_url),
	};

	TestApp {
		app: router(state),
		store,
		codec,
	}
}

fn shipping_address() -> Value {
	json!({
		"shippingAddress": {
			"street": "1 MG Road",
			"city": "Bengaluru",
			"state": "KA",
			"country": "IN",
			"pincode": "560001",
			"phone": "9999999999",
		},
	})
}

#[tokio::test]
async fn create_order_prices_cart_against_catalog() {
	let app = test_app(
		vec![cart_line("p1", 2)],
		vec![product("p1", 150, Currency::Inr, 10)],
	)
	.await;
	let token = app.token("u-1", Role::User);

	let (status, body) = app
		.request("POST", "/api/orders", &token, Some(shipping_address()))
		.await;

	assert_eq!(status, StatusCode::CREATED);
	let order = &body["order"];
	assert_eq!(order["status"], "PENDING");
	assert_eq!(order["user"], "u-1");
	assert_eq!(order["totalPrice"]["amount"], "300");
	assert_eq!(order["totalPrice"]["currency"], "INR");
	assert_eq!(order["items"].as_array().unwrap().len(), 1);
	assert_eq!(order["items"][0]["productId"], "p1");
	assert_eq!(order["items"][0]["quantity"], 2);
	assert_eq!(order["items"][0]["price"]["amount"], "300");

	assert_eq!(app.store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn create_order_totals_multiple_lines() {
	let app = test_app(
		vec![cart_line("p1", 2), cart_line("p2", 3)],
		vec![
			product("p1", 150, Currency::Inr, 10),
			product("p2", 40, Currency::Inr, 5),
		],
	)
	.await;
	let token = app.token("u-1", Role::User);

	let (status, body) = app
		.request("POST", "/api/orders", &token, Some(shipping_address()))
		.await;

	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(body["order"]["items"].as_array().unwrap().len(), 2);
	assert_eq!(body["order"]["totalPrice"]["amount"], "420");
}

#[tokio::test]
async fn empty_cart_is_a_client_error() {
	let app = test_app(vec![], vec![]).await;
	let token = app.token("u-1", Role::User);

	let (status, body) = app
		.request("POST", "/api/orders", &token, Some(shipping_address()))
		.await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "EMPTY_CART");
	assert_eq!(app.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn absent_cart_is_treated_as_empty() {
	// A cart service without a record answers 404; the workflow folds
	// that into an empty cart and rejects creation as a client error.
	let cart_url = spawn(Router::new().route(
		"/api/cart",
		get(|| async {
			(
				StatusCode::NOT_FOUND,
				Json(json!({"message": "Cart not found"})),
			)
		}),
	))
	.await;
	let catalog_url = spawn(stub_catalog(vec![])).await;
	let app = test_app_with_urls(cart_url, catalog_url);
	let token = app.token("u-1", Role::User);

	let (status, body) = app
		.request("POST", "/api/orders", &token, Some(shipping_address()))
		.await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "EMPTY_CART");
	assert_eq!(app.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn insufficient_stock_aborts_whole_order() {
	let app = test_app(
		vec![cart_line("p1", 1), cart_line("p2", 2)],
		vec![
			product("p1", 100, Currency::Inr, 10),
			product("p2", 150, Currency::Inr, 1),
		],
	)
	.await;
	let token = app.token("u-1", Role::User);

	let (status, body) = app
		.request("POST", "/api/orders", &token, Some(shipping_address()))
		.await;

	assert_eq!(status, StatusCode::CONFLICT);
	assert_eq!(body["error"], "INSUFFICIENT_STOCK");
	assert_eq!(body["details"]["productId"], "p2");
	assert_eq!(body["details"]["requested"], 2);
	assert_eq!(body["details"]["available"], 1);
	// All-or-nothing: the in-stock line must not have produced an order.
	assert_eq!(app.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn unknown_product_fails_with_not_found() {
	let app = test_app(vec![cart_line("ghost", 1)], vec![]).await;
	let token = app.token("u-1", Role::User);

	let (status, body) = app
		.request("POST", "/api/orders", &token, Some(shipping_address()))
		.await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["error"], "PRODUCT_NOT_FOUND");
	assert!(body["message"].as_str().unwrap().contains("ghost"));
	assert_eq!(app.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn mixed_currency_cart_is_rejected() {
	let app = test_app(
		vec![cart_line("p1", 1), cart_line("p2", 1)],
		vec![
			product("p1", 100, Currency::Inr, 10),
			product("p2", 20, Currency::Usd, 10),
		],
	)
	.await;
	let token = app.token("u-1", Role::User);

	let (status, body) = app
		.request("POST", "/api/orders", &token, Some(shipping_address()))
		.await;

	assert_eq!(status, StatusCode::CONFLICT);
	assert_eq!(body["error"], "CURRENCY_MISMATCH");
	assert_eq!(app.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn unreachable_cart_service_maps_to_upstream_error() {
	// Bind and immediately drop a listener so the port refuses connections.
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let dead_url = format!("http://{}", listener.local_addr().unwrap());
	drop(listener);

	let catalog_url = spawn(stub_catalog(vec![])).await;
	let app = test_app_with_urls(dead_url, catalog_url);
	let token = app.token("u-1", Role::User);

	let (status, body) = app
		.request("POST", "/api/orders", &token, Some(shipping_address()))
		.await;

	assert_eq!(status, StatusCode::BAD_GATEWAY);
	assert_eq!(body["error"], "UPSTREAM_UNAVAILABLE");
	assert_eq!(app.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn missing_address_fails_validation() {
	let app = test_app(
		vec![cart_line("p1", 1)],
		vec![product("p1", 100, Currency::Inr, 10)],
	)
	.await;
	let token = app.token("u-1", Role::User);

	let (status, _) = app
		.request(
			"POST",
			"/api/orders",
			&token,
			Some(json!({"shippingAddress": {"street": "x"}})),
		)
		.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);

	let (status, body) = app
		.request(
			"POST",
			"/api/orders",
			&token,
			Some(json!({
				"shippingAddress": {
					"street": "1 MG Road",
					"city": "Bengaluru",
					"state": "KA",
					"country": "IN",
					"pincode": "12",
				},
			})),
		)
		.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn requests_without_token_are_unauthorized() {
	let app = test_app(vec![], vec![]).await;

	let request = Request::builder()
		.method("GET")
		.uri("/api/orders/me")
		.body(Body::empty())
		.unwrap();
	let response = app.app.clone().oneshot(request).await.unwrap();
	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

async fn created_order_id(app: &TestApp, token: &str) -> String {
	let (status, body) = app
		.request("POST", "/api/orders", token, Some(shipping_address()))
		.await;
	assert_eq!(status, StatusCode::CREATED);
	body["order"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn cancel_transitions_pending_exactly_once() {
	let app = test_app(
		vec![cart_line("p1", 1)],
		vec![product("p1", 100, Currency::Inr, 10)],
	)
	.await;
	let token = app.token("u-1", Role::User);
	let order_id = created_order_id(&app, &token).await;

	let (status, body) = app
		.request(
			"POST",
			&format!("/api/orders/{}/cancel", order_id),
			&token,
			None,
		)
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["order"]["status"], "CANCELLED");

	// Second cancel must conflict and leave the status alone.
	let (status, body) = app
		.request(
			"POST",
			&format!("/api/orders/{}/cancel", order_id),
			&token,
			None,
		)
		.await;
	assert_eq!(status, StatusCode::CONFLICT);
	assert_eq!(body["error"], "ORDER_NOT_PENDING");

	let stored = app.store.get(&order_id).await.unwrap();
	assert_eq!(stored.status, shop_types::OrderStatus::Cancelled);
}

#[tokio::test]
async fn address_update_merges_present_fields() {
	let app = test_app(
		vec![cart_line("p1", 1)],
		vec![product("p1", 100, Currency::Inr, 10)],
	)
	.await;
	let token = app.token("u-1", Role::User);
	let order_id = created_order_id(&app, &token).await;

	let (status, body) = app
		.request(
			"PATCH",
			&format!("/api/orders/{}/address", order_id),
			&token,
			Some(json!({"shippingAddress": {"city": "Mumbai", "pincode": "400001"}})),
		)
		.await;

	assert_eq!(status, StatusCode::OK);
	let address = &body["order"]["shippingAddress"];
	assert_eq!(address["city"], "Mumbai");
	assert_eq!(address["pincode"], "400001");
	// Absent fields keep their prior values.
	assert_eq!(address["street"], "1 MG Road");
	assert_eq!(address["country"], "IN");
}

#[tokio::test]
async fn address_update_after_cancel_conflicts() {
	let app = test_app(
		vec![cart_line("p1", 1)],
		vec![product("p1", 100, Currency::Inr, 10)],
	)
	.await;
	let token = app.token("u-1", Role::User);
	let order_id = created_order_id(&app, &token).await;

	app.request(
		"POST",
		&format!("/api/orders/{}/cancel", order_id),
		&token,
		None,
	)
	.await;

	let (status, body) = app
		.request(
			"PATCH",
			&format!("/api/orders/{}/address", order_id),
			&token,
			Some(json!({"shippingAddress": {"city": "Mumbai"}})),
		)
		.await;
	assert_eq!(status, StatusCode::CONFLICT);
	assert_eq!(body["error"], "ORDER_NOT_PENDING");

	let stored = app.store.get(&order_id).await.unwrap();
	assert_eq!(stored.shipping_address.city, "Bengaluru");
}

#[tokio::test]
async fn strangers_get_forbidden_never_data() {
	let app = test_app(
		vec![cart_line("p1", 1)],
		vec![product("p1", 100, Currency::Inr, 10)],
	)
	.await;
	let owner = app.token("u-1", Role::User);
	let stranger = app.token("u-2", Role::User);
	let order_id = created_order_id(&app, &owner).await;

	let (status, body) = app
		.request("GET", &format!("/api/orders/{}", order_id), &stranger, None)
		.await;
	assert_eq!(status, StatusCode::FORBIDDEN);
	assert!(body.get("order").is_none());

	let (status, _) = app
		.request(
			"POST",
			&format!("/api/orders/{}/cancel", order_id),
			&stranger,
			None,
		)
		.await;
	assert_eq!(status, StatusCode::FORBIDDEN);

	let (status, _) = app
		.request(
			"PATCH",
			&format!("/api/orders/{}/address", order_id),
			&stranger,
			Some(json!({"shippingAddress": {"city": "Mumbai"}})),
		)
		.await;
	assert_eq!(status, StatusCode::FORBIDDEN);

	// The order is untouched.
	let stored = app.store.get(&order_id).await.unwrap();
	assert_eq!(stored.status, shop_types::OrderStatus::Pending);
	assert_eq!(stored.shipping_address.city, "Bengaluru");
}

#[tokio::test]
async fn admin_may_read_any_order() {
	let app = test_app(
		vec![cart_line("p1", 1)],
		vec![product("p1", 100, Currency::Inr, 10)],
	)
	.await;
	let owner = app.token("u-1", Role::User);
	let admin = app.token("root", Role::Admin);
	let order_id = created_order_id(&app, &owner).await;

	let (status, body) = app
		.request("GET", &format!("/api/orders/{}", order_id), &admin, None)
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["order"]["user"], "u-1");
}

#[tokio::test]
async fn unknown_order_is_not_found() {
	let app = test_app(vec![], vec![]).await;
	let token = app.token("u-1", Role::User);

	let (status, body) = app
		.request("GET", "/api/orders/no-such-order", &token, None)
		.await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["error"], "ORDER_NOT_FOUND");
}

#[tokio::test]
async fn listing_is_scoped_paginated_and_newest_first() {
	let app = test_app(
		vec![cart_line("p1", 1)],
		vec![product("p1", 100, Currency::Inr, 10)],
	)
	.await;
	let mine = app.token("u-1", Role::User);
	let other = app.token("u-2", Role::User);

	let mut created = Vec::new();
	for _ in 0..3 {
		created.push(created_order_id(&app, &mine).await);
		// Keep created_at strictly ordered.
		tokio::time::sleep(Duration::from_millis(5)).await;
	}
	created_order_id(&app, &other).await;

	let (status, body) = app
		.request("GET", "/api/orders/me?page=1&limit=2", &mine, None)
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["meta"]["total"], 3);
	assert_eq!(body["meta"]["page"], 1);
	assert_eq!(body["meta"]["limit"], 2);

	let orders = body["orders"].as_array().unwrap();
	assert_eq!(orders.len(), 2);
	// Newest first.
	assert_eq!(orders[0]["id"], created[2].as_str());
	assert_eq!(orders[1]["id"], created[1].as_str());

	let (_, body) = app
		.request("GET", "/api/orders/me?page=2&limit=2", &mine, None)
		.await;
	let orders = body["orders"].as_array().unwrap();
	assert_eq!(orders.len(), 1);
	assert_eq!(orders[0]["id"], created[0].as_str());

	// Oversized limits are clamped rather than honored.
	let (_, body) = app
		.request("GET", "/api/orders/me?limit=99999", &mine, None)
		.await;
	assert_eq!(body["meta"]["limit"], shop_types::MAX_PAGE_SIZE);
}

#[tokio::test]
async fn seller_tokens_cannot_place_orders() {
	let app = test_app(
		vec![cart_line("p1", 1)],
		vec![product("p1", 100, Currency::Inr, 10)],
	)
	.await;
	let seller = app.token("s-1", Role::Seller);

	let (status, _) = app
		.request("POST", "/api/orders", &seller, Some(shipping_address()))
		.await;
	assert_eq!(status, StatusCode::FORBIDDEN);
}
