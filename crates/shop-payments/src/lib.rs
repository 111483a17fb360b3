//! Payment stub service.
//!
//! Deliberately a stub: it verifies the order through the order service
//! contract, records a payment intent for the order's total, and stops
//! there. No gateway integration, no capture, no refunds.

pub mod api;
pub mod store;

use axum::extract::FromRef;
use axum::routing::{get, post};
use axum::Router;
use shop_auth::TokenCodec;
use shop_clients::OrderClient;
use std::sync::Arc;
use store::PaymentStore;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared state for the payment service router.
#[derive(Clone)]
pub struct AppState {
	pub store: Arc<PaymentStore>,
	pub codec: Arc<TokenCodec>,
	pub orders: OrderClient,
}

impl FromRef<AppState> for Arc<TokenCodec> {
	fn from_ref(state: &AppState) -> Self {
		state.codec.clone()
	}
}

/// Builds the payment service router.
pub fn router(state: AppState) -> Router {
	Router::new()
		.nest(
			"/api/payments",
			Router::new()
				.route("/create/{order_id}", post(api::create_payment))
				.route("/{id}", get(api::get_payment)),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}
