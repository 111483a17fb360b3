//! Revoked-token denylist.
//!
//! Logout stores the presented token here with a TTL comfortably past the
//! token's own expiry, so a revoked credential stays dead for its whole
//! remaining lifetime and the entry then ages out on its own. Tokens are
//! keyed by their SHA-256 digest; the storage layer never sees raw
//! credentials.

use sha2::{Digest, Sha256};
use shop_storage::{StorageError, StorageService};
use std::time::Duration;

const NAMESPACE: &str = "token_denylist";

/// Denylist of revoked tokens, TTL-bounded.
pub struct TokenDenylist {
	storage: StorageService,
	ttl: Duration,
}

impl TokenDenylist {
	pub fn new(storage: StorageService, ttl: Duration) -> Self {
		Self { storage, ttl }
	}

	fn digest(token: &str) -> String {
		hex::encode(Sha256::digest(token.as_bytes()))
	}

	/// Marks a token as revoked.
	pub async fn revoke(&self, token: &str) -> Result<(), StorageError> {
		self.storage
			.store_with_ttl(NAMESPACE, &Self::digest(token), &true, Some(self.ttl))
			.await
	}

	/// Whether a token has been revoked.
	pub async fn is_revoked(&self, token: &str) -> Result<bool, StorageError> {
		self.storage.exists(NAMESPACE, &Self::digest(token)).await
	}

	/// Reaps expired entries; returns how many were removed.
	pub async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		self.storage.cleanup_expired().await
	}
}
