//! Monetary types for the shop platform.
//!
//! Amounts are exact decimals, never floats. A `Money` value always carries
//! its currency so cross-currency arithmetic has to be an explicit decision
//! at the call site rather than a silent addition.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currencies accepted by the platform.
///
/// The set mirrors what the catalog is allowed to price products in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
	Usd,
	Inr,
}

impl fmt::Display for Currency {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Currency::Usd => write!(f, "USD"),
			Currency::Inr => write!(f, "INR"),
		}
	}
}

impl std::str::FromStr for Currency {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_uppercase().as_str() {
			"USD" => Ok(Currency::Usd),
			"INR" => Ok(Currency::Inr),
			other => Err(format!("unsupported currency: {}", other)),
		}
	}
}

/// An amount of money in a specific currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
	/// Exact decimal amount.
	pub amount: Decimal,
	/// Currency the amount is denominated in.
	pub currency: Currency,
}

impl Money {
	/// Creates a new amount in the given currency.
	pub fn new(amount: Decimal, currency: Currency) -> Self {
		Self { amount, currency }
	}

	/// Zero in the given currency, useful as a fold seed.
	pub fn zero(currency: Currency) -> Self {
		Self {
			amount: Decimal::ZERO,
			currency,
		}
	}

	/// Multiplies the amount by an integer quantity, keeping the currency.
	pub fn times(&self, quantity: u32) -> Self {
		Self {
			amount: self.amount * Decimal::from(quantity),
			currency: self.currency,
		}
	}

	/// Adds another amount of the same currency.
	///
	/// Returns `None` when the currencies differ; callers decide whether
	/// that is a validation failure or a conflict.
	pub fn checked_add(&self, other: &Money) -> Option<Money> {
		if self.currency != other.currency {
			return None;
		}
		Some(Money {
			amount: self.amount + other.amount,
			currency: self.currency,
		})
	}
}

impl fmt::Display for Money {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.amount, self.currency)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn times_scales_amount() {
		let unit = Money::new(Decimal::from(150), Currency::Inr);
		let line = unit.times(2);
		assert_eq!(line.amount, Decimal::from(300));
		assert_eq!(line.currency, Currency::Inr);
	}

	#[test]
	fn checked_add_rejects_mixed_currencies() {
		let a = Money::new(Decimal::from(10), Currency::Usd);
		let b = Money::new(Decimal::from(10), Currency::Inr);
		assert!(a.checked_add(&b).is_none());
		let sum = a.checked_add(&Money::new(Decimal::from(5), Currency::Usd)).unwrap();
		assert_eq!(sum.amount, Decimal::from(15));
	}

	#[test]
	fn currency_serializes_uppercase() {
		let json = serde_json::to_string(&Currency::Inr).unwrap();
		assert_eq!(json, "\"INR\"");
		let back: Currency = serde_json::from_str("\"USD\"").unwrap();
		assert_eq!(back, Currency::Usd);
	}
}
