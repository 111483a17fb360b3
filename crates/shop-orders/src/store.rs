//! Persisted order collection.
//!
//! A thin typed layer over [`StorageService`]: orders live under one
//! namespace keyed by order id. Mutations of an existing order go through
//! `swap_against`, which carries the previously read snapshot as a
//! precondition, so the storage layer rejects the write if another request
//! got there first.

use shop_storage::{StorageError, StorageService};
use shop_types::Order;

const NAMESPACE: &str = "orders";

/// Typed access to the order collection.
pub struct OrderStore {
	storage: StorageService,
}

impl OrderStore {
	pub fn new(storage: StorageService) -> Self {
		Self { storage }
	}

	/// Persists a new order. Refuses to overwrite an existing id.
	pub async fn insert(&self, order: &Order) -> Result<(), StorageError> {
		self.storage.insert(NAMESPACE, &order.id, order).await
	}

	/// Loads one order by id.
	pub async fn get(&self, order_id: &str) -> Result<Order, StorageError> {
		self.storage.retrieve(NAMESPACE, order_id).await
	}

	/// Replaces `snapshot` with `updated`, failing with
	/// [`StorageError::PreconditionFailed`] when the stored order no longer
	/// matches the snapshot the caller read.
	pub async fn swap_against(
		&self,
		snapshot: &Order,
		updated: &Order,
	) -> Result<(), StorageError> {
		self.storage
			.swap(NAMESPACE, &snapshot.id, snapshot, updated)
			.await
	}

	/// All orders owned by `owner`, newest first.
	pub async fn list_by_owner(&self, owner: &str) -> Result<Vec<Order>, StorageError> {
		let mut orders: Vec<Order> = self
			.storage
			.retrieve_all(NAMESPACE)
			.await?
			.into_iter()
			.filter(|order: &Order| order.user == owner)
			.collect();
		orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		Ok(orders)
	}

	/// Number of orders in the collection, any owner. Test support.
	pub async fn count(&self) -> Result<usize, StorageError> {
		Ok(self.storage.list_ids(NAMESPACE).await?.len())
	}
}
