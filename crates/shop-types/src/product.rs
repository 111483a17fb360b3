//! Product entity owned by the catalog service.

use crate::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
	pub id: String,
	pub title: String,
	#[serde(default)]
	pub description: String,
	/// Unit price in the seller's chosen currency.
	pub price: Money,
	/// Identifier of the seller who listed the product.
	pub seller: String,
	/// Units available; orders never exceed this at creation time.
	pub stock: u32,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}
