//! Persisted cart collection, keyed by owning user.

use shop_storage::{StorageError, StorageService};
use shop_types::Cart;

const NAMESPACE: &str = "carts";

/// Typed access to the cart collection.
pub struct CartStore {
	storage: StorageService,
}

impl CartStore {
	pub fn new(storage: StorageService) -> Self {
		Self { storage }
	}

	/// Loads a user's cart, or `None` when they have none yet.
	pub async fn get(&self, user: &str) -> Result<Option<Cart>, StorageError> {
		match self.storage.retrieve(NAMESPACE, user).await {
			Ok(cart) => Ok(Some(cart)),
			Err(StorageError::NotFound) => Ok(None),
			Err(err) => Err(err),
		}
	}

	/// Saves a user's cart, creating or replacing it.
	pub async fn put(&self, cart: &Cart) -> Result<(), StorageError> {
		self.storage.store(NAMESPACE, &cart.user, cart).await
	}
}
