//! Persisted user collection.
//!
//! Users are stored by id; username and email lookups scan the collection,
//! which is the document-store trade-off this platform accepts everywhere.

use shop_storage::{StorageError, StorageService};
use shop_types::User;

const NAMESPACE: &str = "users";

/// Typed access to the user collection.
pub struct UserStore {
	storage: StorageService,
}

impl UserStore {
	pub fn new(storage: StorageService) -> Self {
		Self { storage }
	}

	/// Persists a new user. Refuses to overwrite an existing id.
	pub async fn insert(&self, user: &User) -> Result<(), StorageError> {
		self.storage.insert(NAMESPACE, &user.id, user).await
	}

	pub async fn get(&self, user_id: &str) -> Result<User, StorageError> {
		self.storage.retrieve(NAMESPACE, user_id).await
	}

	/// Replaces an existing user record.
	pub async fn put(&self, user: &User) -> Result<(), StorageError> {
		self.storage.update(NAMESPACE, &user.id, user).await
	}

	/// Finds a user by exact username or email.
	pub async fn find_by_identifier(
		&self,
		username: Option<&str>,
		email: Option<&str>,
	) -> Result<Option<User>, StorageError> {
		let users: Vec<User> = self.storage.retrieve_all(NAMESPACE).await?;
		Ok(users.into_iter().find(|user| {
			username.is_some_and(|u| user.username == u)
				|| email.is_some_and(|e| user.email == e)
		}))
	}
}
