//! HTTP handlers for the catalog service.
//!
//! Reads are public; writes are gated to sellers (creation also allows
//! admins) and scoped to the seller's own listings.

use crate::store::ProductFilter;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shop_auth::Authenticated;
use shop_storage::StorageError;
use shop_types::{ApiError, Currency, Money, Product, Role, SkipQuery, ValidatedJson};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Response envelope for single-product endpoints.
#[derive(Debug, Serialize)]
pub struct ProductEnvelope {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	pub data: Product,
}

/// Response envelope for listings.
#[derive(Debug, Serialize)]
pub struct ProductsEnvelope {
	pub data: Vec<Product>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
	#[validate(length(min = 1, message = "title is required"))]
	pub title: String,
	#[validate(length(max = 500, message = "description must be at most 500 characters"))]
	#[serde(default)]
	pub description: String,
	#[validate(custom(function = validate_price_amount))]
	pub price_amount: Decimal,
	pub price_currency: Currency,
	#[serde(default)]
	pub stock: u32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
	#[validate(length(min = 1, message = "title cannot be empty"))]
	pub title: Option<String>,
	#[validate(length(max = 500, message = "description must be at most 500 characters"))]
	pub description: Option<String>,
	#[validate(custom(function = validate_price_amount))]
	pub price_amount: Option<Decimal>,
	pub price_currency: Option<Currency>,
	pub stock: Option<u32>,
}

/// Listing filters; all optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
	pub q: Option<String>,
	pub min_price: Option<Decimal>,
	pub max_price: Option<Decimal>,
	#[serde(flatten)]
	pub window: SkipQuery,
}

fn validate_price_amount(amount: &Decimal) -> Result<(), ValidationError> {
	if amount.is_sign_negative() {
		let mut err = ValidationError::new("priceAmount");
		err.message = Some("priceAmount must not be negative".into());
		return Err(err);
	}
	Ok(())
}

/// Handles `POST /api/products`.
pub async fn create_product(
	State(state): State<AppState>,
	auth: Authenticated,
	ValidatedJson(request): ValidatedJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductEnvelope>), ApiError> {
	auth.require_role(&[Role::Seller, Role::Admin])?;

	let now = chrono::Utc::now();
	let product = Product {
		id: Uuid::new_v4().to_string(),
		title: request.title,
		description: request.description,
		price: Money::new(request.price_amount, request.price_currency),
		seller: auth.user_id().to_string(),
		stock: request.stock,
		created_at: now,
		updated_at: now,
	};
	state.store.insert(&product).await.map_err(storage_error)?;

	tracing::info!(product_id = %product.id, seller = %product.seller, "product created");
	Ok((
		StatusCode::CREATED,
		Json(ProductEnvelope {
			message: Some("Product created".to_string()),
			data: product,
		}),
	))
}

/// Handles `GET /api/products`.
pub async fn list_products(
	State(state): State<AppState>,
	Query(query): Query<ListQuery>,
) -> Result<Json<ProductsEnvelope>, ApiError> {
	let (skip, limit) = query.window.resolve();
	let filter = ProductFilter {
		query: query.q,
		min_price: query.min_price,
		max_price: query.max_price,
	};
	let data = state
		.store
		.list(&filter, skip, limit)
		.await
		.map_err(storage_error)?;
	Ok(Json(ProductsEnvelope { data }))
}

/// Handles `GET /api/products/seller`.
pub async fn list_seller_products(
	State(state): State<AppState>,
	auth: Authenticated,
	Query(query): Query<ListQuery>,
) -> Result<Json<ProductsEnvelope>, ApiError> {
	auth.require_role(&[Role::Seller])?;

	let (skip, limit) = query.window.resolve();
	let data = state
		.store
		.list_by_seller(auth.user_id(), skip, limit)
		.await
		.map_err(storage_error)?;
	Ok(Json(ProductsEnvelope { data }))
}

/// Handles `GET /api/products/{id}`.
pub async fn get_product(
	State(state): State<AppState>,
	Path(product_id): Path<String>,
) -> Result<Json<ProductEnvelope>, ApiError> {
	let product = state.store.get(&product_id).await.map_err(storage_error)?;
	Ok(Json(ProductEnvelope {
		message: None,
		data: product,
	}))
}

/// Handles `PATCH /api/products/{id}`.
pub async fn update_product(
	State(state): State<AppState>,
	auth: Authenticated,
	Path(product_id): Path<String>,
	ValidatedJson(request): ValidatedJson<UpdateProductRequest>,
) -> Result<Json<ProductEnvelope>, ApiError> {
	auth.require_role(&[Role::Seller])?;

	let mut product = state.store.get(&product_id).await.map_err(storage_error)?;
	require_listing_owner(&product, &auth)?;

	if let Some(title) = request.title {
		product.title = title;
	}
	if let Some(description) = request.description {
		product.description = description;
	}
	if let Some(amount) = request.price_amount {
		product.price.amount = amount;
	}
	if let Some(currency) = request.price_currency {
		product.price.currency = currency;
	}
	if let Some(stock) = request.stock {
		product.stock = stock;
	}
	product.updated_at = chrono::Utc::now();

	state.store.put(&product).await.map_err(storage_error)?;
	Ok(Json(ProductEnvelope {
		message: Some("Product updated".to_string()),
		data: product,
	}))
}

/// Handles `DELETE /api/products/{id}`.
pub async fn delete_product(
	State(state): State<AppState>,
	auth: Authenticated,
	Path(product_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
	auth.require_role(&[Role::Seller])?;

	let product = state.store.get(&product_id).await.map_err(storage_error)?;
	require_listing_owner(&product, &auth)?;

	state.store.delete(&product_id).await.map_err(storage_error)?;
	tracing::info!(product_id = %product_id, "product deleted");
	Ok(Json(serde_json::json!({ "message": "Product deleted" })))
}

fn require_listing_owner(product: &Product, auth: &Authenticated) -> Result<(), ApiError> {
	if product.seller == auth.user_id() {
		return Ok(());
	}
	Err(ApiError::forbidden(
		"NOT_LISTING_OWNER",
		"Forbidden: you do not own this product",
	))
}

fn storage_error(err: StorageError) -> ApiError {
	match err {
		StorageError::NotFound => ApiError::not_found("PRODUCT_NOT_FOUND", "Product not found"),
		other => {
			tracing::error!(error = %other, "product storage failure");
			ApiError::internal("Product storage failure")
		},
	}
}
