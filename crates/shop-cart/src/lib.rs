//! Cart service.
//!
//! Owns per-user cart state: one cart per user, created lazily on first
//! read. Lines are unpriced `{productId, quantity}` pairs; pricing is the
//! order workflow's job at checkout time.

pub mod api;
pub mod store;

use axum::extract::FromRef;
use axum::routing::{get, patch, post};
use axum::Router;
use shop_auth::TokenCodec;
use std::sync::Arc;
use store::CartStore;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared state for the cart service router.
#[derive(Clone)]
pub struct AppState {
	pub store: Arc<CartStore>,
	pub codec: Arc<TokenCodec>,
}

impl FromRef<AppState> for Arc<TokenCodec> {
	fn from_ref(state: &AppState) -> Self {
		state.codec.clone()
	}
}

/// Builds the cart service router.
pub fn router(state: AppState) -> Router {
	Router::new()
		.nest(
			"/api/cart",
			Router::new()
				.route("/", get(api::get_cart))
				.route("/items", post(api::add_item))
				.route("/items/{product_id}", patch(api::update_item)),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}
