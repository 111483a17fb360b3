//! HTTP clients for the sibling-service contracts.
//!
//! The order workflow consumes the cart and catalog contracts; the payment
//! stub consumes the order contract. Every client is built once at startup
//! around a pooled `reqwest::Client` with a bounded per-call timeout, and
//! forwards the caller's bearer token so authorization context travels with
//! the request. There is deliberately no retry here: a transient downstream
//! failure surfaces to the caller as retryable.

use serde::Deserialize;
use shop_types::{CartTotals, CartView, Order, Product};
use std::time::Duration;
use thiserror::Error;

/// Errors produced by the sibling-service clients.
#[derive(Debug, Error)]
pub enum ClientError {
	/// The sibling answered with a non-success status.
	#[error("Upstream returned {status}: {message}")]
	Status { status: u16, message: String },
	/// Transport-level failure: connect error, timeout, or undecodable body.
	#[error("Upstream unreachable: {0}")]
	Transport(String),
}

impl From<reqwest::Error> for ClientError {
	fn from(err: reqwest::Error) -> Self {
		ClientError::Transport(err.to_string())
	}
}

/// Builds the pooled HTTP client every service client shares.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ClientError> {
	reqwest::Client::builder()
		.pool_idle_timeout(Duration::from_secs(90))
		.pool_max_idle_per_host(10)
		.timeout(timeout)
		.build()
		.map_err(ClientError::from)
}

async fn error_message(response: reqwest::Response) -> ClientError {
	#[derive(Deserialize)]
	struct Envelope {
		message: Option<String>,
	}

	let status = response.status().as_u16();
	let message = match response.json::<Envelope>().await {
		Ok(envelope) => envelope.message.unwrap_or_default(),
		Err(_) => String::new(),
	};
	ClientError::Status { status, message }
}

/// Client for the cart service contract.
#[derive(Clone)]
pub struct CartClient {
	http: reqwest::Client,
	base_url: String,
}

impl CartClient {
	pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
		Self {
			http,
			base_url: base_url.into(),
		}
	}

	/// Fetches the bearer identity's current cart.
	///
	/// A missing cart is not an error at this boundary: the cart service
	/// creates one lazily, and a 404 from an implementation that does not
	/// is folded into an empty cart here.
	pub async fn current_cart(&self, token: &str) -> Result<CartView, ClientError> {
		#[derive(Deserialize)]
		struct Envelope {
			cart: CartView,
		}

		let url = format!("{}/api/cart", self.base_url);
		let response = self.http.get(&url).bearer_auth(token).send().await?;
		if response.status() == reqwest::StatusCode::NOT_FOUND {
			return Ok(CartView {
				items: Vec::new(),
				totals: CartTotals {
					item_count: 0,
					total_quantity: 0,
				},
			});
		}
		if !response.status().is_success() {
			return Err(error_message(response).await);
		}
		Ok(response.json::<Envelope>().await?.cart)
	}
}

/// Client for the product catalog service contract.
#[derive(Clone)]
pub struct CatalogClient {
	http: reqwest::Client,
	base_url: String,
}

impl CatalogClient {
	pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
		Self {
			http,
			base_url: base_url.into(),
		}
	}

	/// Fetches one product by id. `Ok(None)` means the catalog does not
	/// know the product; any other failure is upstream trouble.
	pub async fn product(&self, token: &str, product_id: &str) -> Result<Option<Product>, ClientError> {
		#[derive(Deserialize)]
		struct Envelope {
			data: Product,
		}

		let url = format!("{}/api/products/{}", self.base_url, product_id);
		let response = self.http.get(&url).bearer_auth(token).send().await?;
		if response.status() == reqwest::StatusCode::NOT_FOUND {
			return Ok(None);
		}
		if !response.status().is_success() {
			return Err(error_message(response).await);
		}
		Ok(Some(response.json::<Envelope>().await?.data))
	}
}

/// Client for the order service contract.
#[derive(Clone)]
pub struct OrderClient {
	http: reqwest::Client,
	base_url: String,
}

impl OrderClient {
	pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
		Self {
			http,
			base_url: base_url.into(),
		}
	}

	/// Fetches one order by id on behalf of the bearer identity.
	///
	/// Status errors (404, 403) are surfaced as [`ClientError::Status`] so
	/// the payment service can propagate them to its own caller.
	pub async fn order(&self, token: &str, order_id: &str) -> Result<Order, ClientError> {
		#[derive(Deserialize)]
		struct Envelope {
			order: Order,
		}

		let url = format!("{}/api/orders/{}", self.base_url, order_id);
		let response = self.http.get(&url).bearer_auth(token).send().await?;
		if !response.status().is_success() {
			return Err(error_message(response).await);
		}
		Ok(response.json::<Envelope>().await?.order)
	}
}
