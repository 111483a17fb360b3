//! Order workflow service.
//!
//! The one place in the platform where entities from three services meet:
//! order creation reads the caller's cart, prices every line against the
//! catalog, validates stock, and persists an immutable priced order. The
//! remaining operations (list, get, cancel, address update) are gated by
//! ownership and the PENDING state, with status transitions applied through
//! conditional storage writes so concurrent mutations cannot silently
//! clobber each other.
//!
//! Creation is best-effort and non-transactional by design: the workflow
//! never reserves or decrements catalog stock, and a failure at any step
//! aborts with no partial write. Callers retry; the service does not.

pub mod api;
pub mod store;
pub mod workflow;

#[cfg(test)]
mod tests;

use axum::extract::FromRef;
use axum::routing::{get, patch, post};
use axum::Router;
use shop_auth::TokenCodec;
use shop_clients::{CartClient, CatalogClient};
use std::sync::Arc;
use store::OrderStore;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared state for the order service router.
#[derive(Clone)]
pub struct AppState {
	pub store: Arc<OrderStore>,
	pub codec: Arc<TokenCodec>,
	pub carts: CartClient,
	pub catalog: CatalogClient,
}

impl FromRef<AppState> for Arc<TokenCodec> {
	fn from_ref(state: &AppState) -> Self {
		state.codec.clone()
	}
}

/// Builds the order service router.
pub fn router(state: AppState) -> Router {
	Router::new()
		.nest(
			"/api/orders",
			Router::new()
				.route("/", post(api::create_order))
				.route("/me", get(api::list_my_orders))
				.route("/{id}", get(api::get_order))
				.route("/{id}/cancel", post(api::cancel_order))
				.route("/{id}/address", patch(api::update_shipping_address)),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}
