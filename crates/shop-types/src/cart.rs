//! Cart entity owned by the cart service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An unpriced cart line: pricing happens at order creation, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
	pub product_id: String,
	pub quantity: u32,
}

/// A user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
	/// Identifier of the owning user; one cart per user.
	pub user: String,
	#[serde(default)]
	pub items: Vec<CartItem>,
	pub updated_at: DateTime<Utc>,
}

impl Cart {
	/// Creates an empty cart for the given user.
	pub fn empty(user: impl Into<String>, now: DateTime<Utc>) -> Self {
		Self {
			user: user.into(),
			items: Vec::new(),
			updated_at: now,
		}
	}

	/// Number of distinct lines in the cart.
	pub fn item_count(&self) -> usize {
		self.items.len()
	}

	/// Total units across all lines.
	pub fn total_quantity(&self) -> u64 {
		self.items.iter().map(|item| u64::from(item.quantity)).sum()
	}

	/// The wire projection served by the cart endpoint.
	pub fn view(&self) -> CartView {
		CartView {
			items: self.items.clone(),
			totals: CartTotals {
				item_count: self.item_count() as u64,
				total_quantity: self.total_quantity(),
			},
		}
	}
}

/// Aggregate counters shown alongside cart items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
	pub item_count: u64,
	pub total_quantity: u64,
}

/// What the cart endpoint serves: line items plus aggregate totals, without
/// the owner (the bearer identity already names it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
	#[serde(default)]
	pub items: Vec<CartItem>,
	pub totals: CartTotals,
}
