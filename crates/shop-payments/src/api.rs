//! HTTP handlers for the payment stub.

use crate::store::{Payment, PaymentStatus};
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;
use shop_auth::Authenticated;
use shop_clients::ClientError;
use shop_storage::StorageError;
use shop_types::{ApiError, OrderStatus, Role};
use uuid::Uuid;

/// Response envelope for payment endpoints.
#[derive(Debug, Serialize)]
pub struct PaymentEnvelope {
	pub payment: Payment,
}

/// Handles `POST /api/payments/create/{order_id}`.
///
/// The order is fetched through the order service with the caller's own
/// token, so ownership enforcement happens where the order lives; its 404
/// and 403 answers are propagated as-is.
pub async fn create_payment(
	State(state): State<AppState>,
	auth: Authenticated,
	Path(order_id): Path<String>,
) -> Result<(StatusCode, Json<PaymentEnvelope>), ApiError> {
	auth.require_role(&[Role::User])?;

	let order = state
		.orders
		.order(&auth.token, &order_id)
		.await
		.map_err(order_fetch_error)?;

	if order.status != OrderStatus::Pending {
		return Err(ApiError::conflict(
			"ORDER_NOT_PENDING",
			format!("Order is {} and cannot be paid", order.status),
		));
	}

	let payment = Payment {
		id: Uuid::new_v4().to_string(),
		order_id: order.id,
		user: auth.user_id().to_string(),
		amount: order.total_price,
		status: PaymentStatus::Created,
		created_at: chrono::Utc::now(),
	};
	state.store.insert(&payment).await.map_err(storage_error)?;

	tracing::info!(payment_id = %payment.id, order_id = %payment.order_id, "payment recorded");
	Ok((StatusCode::CREATED, Json(PaymentEnvelope { payment })))
}

/// Handles `GET /api/payments/{id}`.
pub async fn get_payment(
	State(state): State<AppState>,
	auth: Authenticated,
	Path(payment_id): Path<String>,
) -> Result<Json<PaymentEnvelope>, ApiError> {
	auth.require_role(&[Role::User])?;

	let payment = state.store.get(&payment_id).await.map_err(storage_error)?;
	if payment.user != auth.user_id() {
		return Err(ApiError::forbidden(
			"NOT_PAYMENT_OWNER",
			"Forbidden: you do not own this payment",
		));
	}
	Ok(Json(PaymentEnvelope { payment }))
}

fn order_fetch_error(err: ClientError) -> ApiError {
	match err {
		ClientError::Status { status: 404, .. } => {
			ApiError::not_found("ORDER_NOT_FOUND", "Order not found")
		},
		ClientError::Status { status: 403, .. } => ApiError::forbidden(
			"NOT_ORDER_OWNER",
			"Forbidden: you do not own this order",
		),
		other => {
			tracing::warn!(error = %other, "order lookup failed");
			ApiError::upstream(
				"UPSTREAM_UNAVAILABLE",
				"Order service is unavailable; retry later",
			)
		},
	}
}

fn storage_error(err: StorageError) -> ApiError {
	match err {
		StorageError::NotFound => ApiError::not_found("PAYMENT_NOT_FOUND", "Payment not found"),
		other => {
			tracing::error!(error = %other, "payment storage failure");
			ApiError::internal("Payment storage failure")
		},
	}
}
