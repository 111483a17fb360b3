//! Order entity and lifecycle types.
//!
//! An order is an immutable pricing snapshot taken at creation time: catalog
//! price changes never retroactively affect a placed order. Only the status
//! (PENDING → CANCELLED) and the shipping address (while PENDING) may change
//! afterwards.

use crate::{Address, Money};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states of an order.
///
/// The only transition the platform performs is `Pending → Cancelled`.
/// `Completed` exists for forward compatibility with settlement flows and is
/// never entered by this workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
	Pending,
	Cancelled,
	Completed,
}

impl OrderStatus {
	/// Whether the order may still be mutated (cancel, address update).
	pub fn is_pending(&self) -> bool {
		matches!(self, OrderStatus::Pending)
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OrderStatus::Pending => write!(f, "PENDING"),
			OrderStatus::Cancelled => write!(f, "CANCELLED"),
			OrderStatus::Completed => write!(f, "COMPLETED"),
		}
	}
}

/// A priced order line.
///
/// `price` is the line total (unit price at creation time multiplied by
/// `quantity`), denominated in the product's catalog currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
	pub product_id: String,
	pub quantity: u32,
	pub price: Money,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
	/// Unique identifier, assigned at creation, immutable.
	pub id: String,
	/// Identifier of the user who created the order; immutable.
	pub user: String,
	/// Priced line snapshots; non-empty and immutable after creation.
	pub items: Vec<LineItem>,
	pub status: OrderStatus,
	/// Sum of line totals, in the single settlement currency.
	pub total_price: Money,
	/// Mutable only while the order is PENDING.
	pub shipping_address: Address,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}
