//! Configuration module for the shop platform.
//!
//! Loads the whole platform's configuration from one TOML file: the shared
//! storage backend, token settings, and one section per service with its
//! bind address and downstream URLs. `${VAR}` / `${VAR:-default}` references
//! are resolved from the environment before parsing, which is how the token
//! signing secret reaches the process without ever being committed to a
//! file. Validation is fail-fast: a service cannot start with a half-formed
//! configuration.

use regex::Regex;
use serde::Deserialize;
use shop_types::SecretString;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the input dump.
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the shop platform.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	/// Shared storage backend configuration.
	pub storage: StorageConfig,
	/// Token issuance and verification settings.
	pub auth_tokens: TokenConfig,
	/// Authentication / user service.
	#[serde(default = "IdentityConfig::default_section")]
	pub identity: IdentityConfig,
	/// Product catalog service.
	#[serde(default = "CatalogConfig::default_section")]
	pub catalog: CatalogConfig,
	/// Cart service.
	#[serde(default = "CartConfig::default_section")]
	pub cart: CartConfig,
	/// Order workflow service.
	#[serde(default = "OrdersConfig::default_section")]
	pub orders: OrdersConfig,
	/// Payment stub service.
	#[serde(default = "PaymentsConfig::default_section")]
	pub payments: PaymentsConfig,
}

/// Which backend persists documents, and where.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
	/// Backend name: "memory" or "file".
	pub backend: String,
	/// Base directory for the file backend.
	#[serde(default = "default_file_path")]
	pub file_path: String,
	/// Interval in seconds for reaping expired entries.
	#[serde(default = "default_cleanup_interval")]
	pub cleanup_interval_seconds: u64,
}

fn default_file_path() -> String {
	"./data".to_string()
}

fn default_cleanup_interval() -> u64 {
	300
}

/// Token issuance and verification settings.
///
/// The secret is deserialized straight into a [`SecretString`]; it is
/// resolved from the environment by the loader and never echoed in logs.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
	/// HS256 signing secret.
	pub secret: SecretString,
	/// Token lifetime in seconds.
	#[serde(default = "default_token_expiry")]
	pub expiry_seconds: u64,
	/// How long revoked tokens stay on the denylist. Must comfortably
	/// exceed the token lifetime.
	#[serde(default = "default_denylist_ttl")]
	pub denylist_ttl_seconds: u64,
}

fn default_token_expiry() -> u64 {
	3600 // 1 hour
}

fn default_denylist_ttl() -> u64 {
	26 * 3600 // token lifetime plus buffer
}

impl TokenConfig {
	pub fn expiry(&self) -> Duration {
		Duration::from_secs(self.expiry_seconds)
	}

	pub fn denylist_ttl(&self) -> Duration {
		Duration::from_secs(self.denylist_ttl_seconds)
	}
}

/// Bind address shared by every service section.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
	#[serde(default = "default_host")]
	pub host: String,
	pub port: u16,
	#[serde(default = "default_enabled")]
	pub enabled: bool,
}

fn default_host() -> String {
	"127.0.0.1".to_string()
}

fn default_enabled() -> bool {
	true
}

impl ListenConfig {
	pub fn bind_address(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}
}

fn listen_on(port: u16) -> ListenConfig {
	ListenConfig {
		host: default_host(),
		port,
		enabled: default_enabled(),
	}
}

/// Authentication / user service section.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
	#[serde(flatten)]
	pub listen: ListenConfig,
}

impl IdentityConfig {
	fn default_section() -> Self {
		Self {
			listen: listen_on(3000),
		}
	}
}

/// Product catalog service section.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
	#[serde(flatten)]
	pub listen: ListenConfig,
}

impl CatalogConfig {
	fn default_section() -> Self {
		Self {
			listen: listen_on(3001),
		}
	}
}

/// Cart service section.
#[derive(Debug, Clone, Deserialize)]
pub struct CartConfig {
	#[serde(flatten)]
	pub listen: ListenConfig,
}

impl CartConfig {
	fn default_section() -> Self {
		Self {
			listen: listen_on(3002),
		}
	}
}

/// Order workflow service section.
#[derive(Debug, Clone, Deserialize)]
pub struct OrdersConfig {
	#[serde(flatten)]
	pub listen: ListenConfig,
	/// Base URL of the cart service.
	#[serde(default = "default_cart_url")]
	pub cart_url: String,
	/// Base URL of the product catalog service.
	#[serde(default = "default_catalog_url")]
	pub catalog_url: String,
	/// Bounded per-call timeout for downstream requests, in seconds.
	#[serde(default = "default_request_timeout")]
	pub request_timeout_seconds: u64,
}

impl OrdersConfig {
	fn default_section() -> Self {
		Self {
			listen: listen_on(3003),
			cart_url: default_cart_url(),
			catalog_url: default_catalog_url(),
			request_timeout_seconds: default_request_timeout(),
		}
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.request_timeout_seconds)
	}
}

/// Payment stub service section.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentsConfig {
	#[serde(flatten)]
	pub listen: ListenConfig,
	/// Base URL of the order service.
	#[serde(default = "default_orders_url")]
	pub orders_url: String,
	/// Bounded per-call timeout for downstream requests, in seconds.
	#[serde(default = "default_request_timeout")]
	pub request_timeout_seconds: u64,
}

impl PaymentsConfig {
	fn default_section() -> Self {
		Self {
			listen: listen_on(3004),
			orders_url: default_orders_url(),
			request_timeout_seconds: default_request_timeout(),
		}
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.request_timeout_seconds)
	}
}

fn default_cart_url() -> String {
	"http://127.0.0.1:3002".to_string()
}

fn default_catalog_url() -> String {
	"http://127.0.0.1:3001".to_string()
}

fn default_orders_url() -> String {
	"http://127.0.0.1:3003".to_string()
}

fn default_request_timeout() -> u64 {
	5
}

impl Config {
	/// Loads configuration from a TOML file, resolving environment
	/// variable references first.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let contents = tokio::fs::read_to_string(path).await?;
		contents.parse()
	}

	/// Validates the configuration to ensure all required fields are set.
	pub fn validate(&self) -> Result<(), ConfigError> {
		match self.storage.backend.as_str() {
			"memory" | "file" => {}
			other => {
				return Err(ConfigError::Validation(format!(
					"Unknown storage backend '{}' (expected 'memory' or 'file')",
					other
				)))
			},
		}

		if self.auth_tokens.secret.is_empty() {
			return Err(ConfigError::Validation(
				"auth_tokens.secret must not be empty".into(),
			));
		}
		if self.auth_tokens.denylist_ttl_seconds <= self.auth_tokens.expiry_seconds {
			return Err(ConfigError::Validation(
				"auth_tokens.denylist_ttl_seconds must exceed expiry_seconds".into(),
			));
		}

		for (name, timeout) in [
			("orders", self.orders.request_timeout_seconds),
			("payments", self.payments.request_timeout_seconds),
		] {
			if timeout == 0 {
				return Err(ConfigError::Validation(format!(
					"{}.request_timeout_seconds must be at least 1",
					name
				)));
			}
		}

		Ok(())
	}
}

impl std::str::FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

/// Resolves `${VAR}` and `${VAR:-default}` references against the
/// process environment. A reference without a default to an unset
/// variable is an error.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let full_match = cap.get(0).unwrap();
		let var_name = cap.get(1).unwrap().as_str();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)))
				},
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}
