//! Main entry point for the shop platform.
//!
//! One binary runs all five services: identity, catalog, cart, orders, and
//! payments. Each service gets its own listener and storage handle; the
//! token codec is built once from the injected secret and shared. A
//! `--service` flag restricts the process to a subset, which is how the
//! services are deployed separately.

use clap::Parser;
use shop_auth::{PasswordHasher, TokenCodec};
use shop_clients::{build_http_client, CartClient, CatalogClient, OrderClient};
use shop_config::{Config, StorageConfig};
use shop_identity::denylist::TokenDenylist;
use shop_storage::{FileStorage, MemoryStorage, StorageService};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Command-line arguments for the shop platform.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	/// Run only the named services (repeatable); default is all enabled
	#[arg(short, long)]
	service: Vec<String>,
}

impl Args {
	fn wants(&self, name: &str) -> bool {
		self.service.is_empty() || self.service.iter().any(|s| s == name)
	}
}

/// Builds a fresh storage handle for one service.
///
/// Services sharing the file backend share a directory but write disjoint
/// namespaces; the memory backend is per-service by construction.
fn build_storage(config: &StorageConfig) -> Result<StorageService, Box<dyn std::error::Error>> {
	match config.backend.as_str() {
		"memory" => Ok(StorageService::new(Box::new(MemoryStorage::new()))),
		"file" => Ok(StorageService::new(Box::new(FileStorage::new(
			config.file_path.clone(),
		)))),
		other => Err(format!("unknown storage backend: {}", other).into()),
	}
}

async fn bind(
	name: &'static str,
	address: &str,
) -> Result<TcpListener, Box<dyn std::error::Error>> {
	let listener = TcpListener::bind(address).await?;
	tracing::info!("{} service listening on {}", name, address);
	Ok(listener)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};
	let env_filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(args.log_level.clone()));
	fmt().with_env_filter(env_filter).with_target(true).init();

	let config = Config::from_file(args.config.to_str().ok_or("invalid config path")?).await?;
	tracing::info!("Loaded configuration from {}", args.config.display());

	// The signing secret is loaded once here and shared by reference.
	let codec = Arc::new(TokenCodec::new(
		config.auth_tokens.secret.clone(),
		config.auth_tokens.expiry(),
	));

	let mut servers = Vec::new();

	if config.identity.listen.enabled && args.wants("identity") {
		let denylist = Arc::new(TokenDenylist::new(
			build_storage(&config.storage)?,
			config.auth_tokens.denylist_ttl(),
		));
		spawn_denylist_cleanup(
			denylist.clone(),
			Duration::from_secs(config.storage.cleanup_interval_seconds),
		);

		let state = shop_identity::AppState {
			users: Arc::new(shop_identity::store::UserStore::new(build_storage(
				&config.storage,
			)?)),
			denylist,
			codec: codec.clone(),
			hasher: PasswordHasher::default(),
		};
		let listener = bind("identity", &config.identity.listen.bind_address()).await?;
		servers.push(tokio::spawn(async move {
			axum::serve(listener, shop_identity::router(state)).await
		}));
	}

	if config.catalog.listen.enabled && args.wants("catalog") {
		let state = shop_catalog::AppState {
			store: Arc::new(shop_catalog::store::ProductStore::new(build_storage(
				&config.storage,
			)?)),
			codec: codec.clone(),
		};
		let listener = bind("catalog", &config.catalog.listen.bind_address()).await?;
		servers.push(tokio::spawn(async move {
			axum::serve(listener, shop_catalog::router(state)).await
		}));
	}

	if config.cart.listen.enabled && args.wants("cart") {
		let state = shop_cart::AppState {
			store: Arc::new(shop_cart::store::CartStore::new(build_storage(
				&config.storage,
			)?)),
			codec: codec.clone(),
		};
		let listener = bind("cart", &config.cart.listen.bind_address()).await?;
		servers.push(tokio::spawn(async move {
			axum::serve(listener, shop_cart::router(state)).await
		}));
	}

	if config.orders.listen.enabled && args.wants("orders") {
		let http = build_http_client(config.orders.request_timeout())?;
		let state = shop_orders::AppState {
			store: Arc::new(shop_orders::store::OrderStore::new(build_storage(
				&config.storage,
			)?)),
			codec: codec.clone(),
			carts: CartClient::new(http.clone(), config.orders.cart_url.clone()),
			catalog: CatalogClient::new(http, config.orders.catalog_url.clone()),
		};
		let listener = bind("orders", &config.orders.listen.bind_address()).await?;
		servers.push(tokio::spawn(async move {
			axum::serve(listener, shop_orders::router(state)).await
		}));
	}

	if config.payments.listen.enabled && args.wants("payments") {
		let http = build_http_client(config.payments.request_timeout())?;
		let state = shop_payments::AppState {
			store: Arc::new(shop_payments::store::PaymentStore::new(build_storage(
				&config.storage,
			)?)),
			codec: codec.clone(),
			orders: OrderClient::new(http, config.payments.orders_url.clone()),
		};
		let listener = bind("payments", &config.payments.listen.bind_address()).await?;
		servers.push(tokio::spawn(async move {
			axum::serve(listener, shop_payments::router(state)).await
		}));
	}

	if servers.is_empty() {
		return Err("no services selected or enabled".into());
	}

	// Run until the first server fails; a healthy deployment never
	// reaches the error paths below.
	for result in futures::future::join_all(servers).await {
		result??;
	}

	Ok(())
}

/// Periodically reaps expired denylist entries.
fn spawn_denylist_cleanup(denylist: Arc<TokenDenylist>, interval: Duration) {
	tokio::spawn(async move {
		let mut ticker = tokio::time::interval(interval);
		ticker.tick().await; // first tick fires immediately; skip it
		loop {
			ticker.tick().await;
			match denylist.cleanup_expired().await {
				Ok(0) => {}
				Ok(removed) => tracing::debug!(removed, "reaped expired denylist entries"),
				Err(err) => tracing::warn!(error = %err, "denylist cleanup failed"),
			}
		}
	});
}
