//! Storage module for the shop platform.
//!
//! This module provides the document-store abstraction every service
//! persists through: a byte-level backend interface with memory and file
//! implementations, and a typed wrapper that handles JSON serialization and
//! key namespacing. Conditional writes (compare-and-swap) are part of the
//! interface because order status transitions must be able to express an
//! expected-prior-state precondition.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

pub use implementations::{file::FileStorage, memory::MemoryStorage};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs when a conditional write loses to a concurrent writer.
	#[error("Precondition failed")]
	PreconditionFailed,
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
}

/// Trait defining the low-level interface for storage backends.
///
/// Basic key-value operations with optional TTL, sorted prefix listing, and
/// an atomic compare-and-swap. The CAS compares the full previous byte value;
/// `expected = None` means "insert only if absent".
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes with optional time-to-live.
	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError>;

	/// Atomically replaces the value at `key` only when the current value
	/// equals `expected`. Fails with [`StorageError::PreconditionFailed`]
	/// when it does not.
	async fn compare_and_swap(
		&self,
		key: &str,
		expected: Option<Vec<u8>>,
		value: Vec<u8>,
	) -> Result<(), StorageError>;

	/// Deletes the value associated with the given key.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Checks if a key exists in storage.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Returns all keys starting with `prefix`, sorted ascending.
	async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

	/// Removes expired entries from storage (optional operation).
	/// Returns the number of entries removed.
	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		Ok(0) // Default for backends without TTL support
	}
}

/// High-level storage service that provides typed operations.
///
/// Wraps a low-level backend and provides convenient methods for storing and
/// retrieving typed data with automatic JSON serialization. Keys are
/// `namespace:id`.
pub struct StorageService {
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn key(namespace: &str, id: &str) -> String {
		format!("{}:{}", namespace, id)
	}

	fn encode<T: Serialize>(data: &T) -> Result<Vec<u8>, StorageError> {
		serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Stores a serializable value with optional time-to-live.
	pub async fn store_with_ttl<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		let bytes = Self::encode(data)?;
		self.backend
			.set_bytes(&Self::key(namespace, id), bytes, ttl)
			.await
	}

	/// Stores a serializable value without time-to-live.
	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		self.store_with_ttl(namespace, id, data, None).await
	}

	/// Retrieves and deserializes a value from storage.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&Self::key(namespace, id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Updates an existing value in storage.
	///
	/// Fails with [`StorageError::NotFound`] when the key does not exist,
	/// making it semantically different from `store` which creates or
	/// overwrites.
	pub async fn update<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let key = Self::key(namespace, id);
		if !self.backend.exists(&key).await? {
			return Err(StorageError::NotFound);
		}
		let bytes = Self::encode(data)?;
		self.backend.set_bytes(&key, bytes, None).await
	}

	/// Replaces a value only if the stored value still equals `expected`.
	///
	/// This is the optimistic-concurrency primitive: callers read a
	/// snapshot, decide on a transition, and swap against that snapshot.
	/// A concurrent writer makes this fail with
	/// [`StorageError::PreconditionFailed`] instead of silently losing
	/// the other update.
	pub async fn swap<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		expected: &T,
		data: &T,
	) -> Result<(), StorageError> {
		let expected_bytes = Self::encode(expected)?;
		let bytes = Self::encode(data)?;
		self.backend
			.compare_and_swap(&Self::key(namespace, id), Some(expected_bytes), bytes)
			.await
	}

	/// Inserts a value only if the key is not already present.
	pub async fn insert<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes = Self::encode(data)?;
		self.backend
			.compare_and_swap(&Self::key(namespace, id), None, bytes)
			.await
	}

	/// Removes a value from storage.
	pub async fn remove(&self, namespace: &str, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&Self::key(namespace, id)).await
	}

	/// Checks if a value exists in storage.
	pub async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&Self::key(namespace, id)).await
	}

	/// Lists the ids stored under a namespace, sorted ascending.
	pub async fn list_ids(&self, namespace: &str) -> Result<Vec<String>, StorageError> {
		let prefix = format!("{}:", namespace);
		let keys = self.backend.list_keys(&prefix).await?;
		Ok(keys
			.into_iter()
			.filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
			.collect())
	}

	/// Retrieves every value stored under a namespace.
	pub async fn retrieve_all<T: DeserializeOwned>(
		&self,
		namespace: &str,
	) -> Result<Vec<T>, StorageError> {
		let mut values = Vec::new();
		for id in self.list_ids(namespace).await? {
			match self.retrieve(namespace, &id).await {
				Ok(value) => values.push(value),
				// A concurrent delete between list and get is not an error.
				Err(StorageError::NotFound) => continue,
				Err(err) => return Err(err),
			}
		}
		Ok(values)
	}

	/// Removes expired entries from storage.
	pub async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		self.backend.cleanup_expired().await
	}
}
