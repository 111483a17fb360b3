//! Persisted payment collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shop_storage::{StorageError, StorageService};
use shop_types::Money;

const NAMESPACE: &str = "payments";

/// Lifecycle states of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
	Created,
	Completed,
	Failed,
}

/// A recorded payment intent against one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
	pub id: String,
	pub order_id: String,
	/// Identifier of the paying user.
	pub user: String,
	/// Amount owed, copied from the order total at creation time.
	pub amount: Money,
	pub status: PaymentStatus,
	pub created_at: DateTime<Utc>,
}

/// Typed access to the payment collection.
pub struct PaymentStore {
	storage: StorageService,
}

impl PaymentStore {
	pub fn new(storage: StorageService) -> Self {
		Self { storage }
	}

	pub async fn insert(&self, payment: &Payment) -> Result<(), StorageError> {
		self.storage.insert(NAMESPACE, &payment.id, payment).await
	}

	pub async fn get(&self, payment_id: &str) -> Result<Payment, StorageError> {
		self.storage.retrieve(NAMESPACE, payment_id).await
	}
}
