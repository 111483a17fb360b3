//! Authentication / user service.
//!
//! Owns user records and credentials: registration, login, logout with a
//! token denylist, the current-user endpoint, and the address book with
//! default-address bookkeeping. Tokens are issued here and verified by
//! every other service against the same injected secret.

pub mod api;
pub mod denylist;
pub mod store;

use axum::extract::FromRef;
use axum::routing::{delete, get, post};
use axum::Router;
use denylist::TokenDenylist;
use shop_auth::{PasswordHasher, TokenCodec};
use std::sync::Arc;
use store::UserStore;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared state for the identity service router.
#[derive(Clone)]
pub struct AppState {
	pub users: Arc<UserStore>,
	pub denylist: Arc<TokenDenylist>,
	pub codec: Arc<TokenCodec>,
	pub hasher: PasswordHasher,
}

impl FromRef<AppState> for Arc<TokenCodec> {
	fn from_ref(state: &AppState) -> Self {
		state.codec.clone()
	}
}

/// Builds the identity service router.
pub fn router(state: AppState) -> Router {
	Router::new()
		.nest(
			"/api/auth",
			Router::new()
				.route("/register", post(api::register))
				.route("/login", post(api::login))
				.route("/me", get(api::current_user))
				.route("/logout", get(api::logout))
				.route(
					"/users/me/addresses",
					get(api::list_addresses).post(api::add_address),
				)
				.route("/users/me/addresses/{address_id}", delete(api::delete_address)),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}
