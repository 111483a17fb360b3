//! Product catalog service.
//!
//! Owns product records: sellers create and maintain their listings, the
//! public reads them, and the order workflow consults price and stock at
//! checkout. Image handling is intentionally absent; listings are text,
//! price, and stock only.

pub mod api;
pub mod store;

use axum::extract::FromRef;
use axum::routing::{get, post};
use axum::Router;
use shop_auth::TokenCodec;
use std::sync::Arc;
use store::ProductStore;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared state for the catalog service router.
#[derive(Clone)]
pub struct AppState {
	pub store: Arc<ProductStore>,
	pub codec: Arc<TokenCodec>,
}

impl FromRef<AppState> for Arc<TokenCodec> {
	fn from_ref(state: &AppState) -> Self {
		state.codec.clone()
	}
}

/// Builds the catalog service router.
///
/// `/seller` is registered before `/{id}` so the literal segment wins.
pub fn router(state: AppState) -> Router {
	Router::new()
		.nest(
			"/api/products",
			Router::new()
				.route("/", post(api::create_product).get(api::list_products))
				.route("/seller", get(api::list_seller_products))
				.route(
					"/{id}",
					get(api::get_product)
						.patch(api::update_product)
						.delete(api::delete_product),
				),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}
