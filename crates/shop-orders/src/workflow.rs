//! Order creation workflow.
//!
//! The sequence is: fetch the caller's cart, fetch every referenced product
//! concurrently, validate stock and currency, price the lines, persist the
//! order in one call. All-or-nothing: any failure before persistence leaves
//! no trace, and a persistence failure surfaces as-is. Catalog stock is
//! never reserved or decremented here.

use crate::store::OrderStore;
use chrono::Utc;
use futures::future::try_join_all;
use rust_decimal::Decimal;
use shop_clients::{CartClient, CatalogClient, ClientError};
use shop_storage::StorageError;
use shop_types::{
	Address, ApiError, CartItem, Currency, LineItem, Money, Order, OrderStatus, Product,
};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while creating an order.
#[derive(Debug, Error)]
pub enum CreateOrderError {
	/// The caller's cart has no items.
	#[error("Cart is empty")]
	EmptyCart,
	/// A cart line references a product the catalog does not know.
	#[error("Product {0} not found")]
	ProductNotFound(String),
	/// A cart line asks for more units than the catalog has.
	#[error("Product {title} has insufficient stock: requested {requested}, available {available}")]
	InsufficientStock {
		product_id: String,
		title: String,
		requested: u32,
		available: u32,
	},
	/// Cart lines price in more than one currency.
	#[error("Cart mixes currencies {0} and {1}")]
	CurrencyMismatch(Currency, Currency),
	/// A downstream call failed or timed out.
	#[error("Downstream call failed: {0}")]
	Upstream(#[from] ClientError),
	/// Persisting the order failed.
	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),
}

impl From<CreateOrderError> for ApiError {
	fn from(err: CreateOrderError) -> Self {
		match &err {
			CreateOrderError::EmptyCart => {
				ApiError::validation("EMPTY_CART", "Cannot create an order from an empty cart")
			},
			CreateOrderError::ProductNotFound(_) => {
				ApiError::not_found("PRODUCT_NOT_FOUND", err.to_string())
			},
			CreateOrderError::InsufficientStock {
				product_id,
				requested,
				available,
				..
			} => ApiError::conflict_with(
				"INSUFFICIENT_STOCK",
				err.to_string(),
				serde_json::json!({
					"productId": product_id,
					"requested": requested,
					"available": available,
				}),
			),
			CreateOrderError::CurrencyMismatch(..) => {
				ApiError::conflict("CURRENCY_MISMATCH", err.to_string())
			},
			CreateOrderError::Upstream(_) => ApiError::upstream(
				"UPSTREAM_UNAVAILABLE",
				"A downstream service is unavailable; retry later",
			),
			CreateOrderError::Storage(_) => ApiError::internal("Failed to persist order"),
		}
	}
}

/// Creates an order for `owner` from their current cart.
///
/// The caller's bearer token travels with both downstream contracts so
/// authorization context is preserved end to end.
pub async fn create_order(
	store: &OrderStore,
	carts: &CartClient,
	catalog: &CatalogClient,
	token: &str,
	owner: &str,
	shipping_address: Address,
) -> Result<Order, CreateOrderError> {
	let cart = carts.current_cart(token).await?;
	if cart.items.is_empty() {
		return Err(CreateOrderError::EmptyCart);
	}

	// Independent reads; issue them all at once. One failure fails the
	// whole operation before anything is written.
	let lookups = cart.items.iter().map(|item| async move {
		let product = catalog
			.product(token, &item.product_id)
			.await?
			.ok_or_else(|| CreateOrderError::ProductNotFound(item.product_id.clone()))?;
		Ok::<(CartItem, Product), CreateOrderError>((item.clone(), product))
	});
	let resolved = try_join_all(lookups).await?;

	let (items, total_price) = price_lines(&resolved)?;

	let now = Utc::now();
	let order = Order {
		id: Uuid::new_v4().to_string(),
		user: owner.to_string(),
		items,
		status: OrderStatus::Pending,
		total_price,
		shipping_address,
		created_at: now,
		updated_at: now,
	};

	store.insert(&order).await?;
	tracing::info!(order_id = %order.id, owner = %order.user, total = %order.total_price, "order created");
	Ok(order)
}

/// Validates stock and currency, prices each line, and accumulates the
/// settlement total. The settlement currency is the single currency shared
/// by every line; mixed carts are rejected outright.
fn price_lines(
	resolved: &[(CartItem, Product)],
) -> Result<(Vec<LineItem>, Money), CreateOrderError> {
	let mut settlement: Option<Currency> = None;
	let mut items = Vec::with_capacity(resolved.len());
	let mut total = Decimal::ZERO;

	for (cart_item, product) in resolved {
		if product.stock < cart_item.quantity {
			return Err(CreateOrderError::InsufficientStock {
				product_id: product.id.clone(),
				title: product.title.clone(),
				requested: cart_item.quantity,
				available: product.stock,
			});
		}

		let currency = product.price.currency;
		match settlement {
			None => settlement = Some(currency),
			Some(expected) if expected != currency => {
				return Err(CreateOrderError::CurrencyMismatch(expected, currency))
			},
			Some(_) => {}
		}

		let line_total = product.price.times(cart_item.quantity);
		total += line_total.amount;
		items.push(LineItem {
			product_id: product.id.clone(),
			quantity: cart_item.quantity,
			price: line_total,
		});
	}

	// Non-empty is checked before lookup, so a settlement currency exists.
	let currency = settlement.ok_or(CreateOrderError::EmptyCart)?;
	Ok((items, Money::new(total, currency)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;

	fn product(id: &str, amount: i64, currency: Currency, stock: u32) -> Product {
		Product {
			id: id.to_string(),
			title: format!("Product {}", id),
			description: String::new(),
			price: Money::new(Decimal::from(amount), currency),
			seller: "s-1".into(),
			stock,
			created_at: Utc::now(),
			updated_at: Utc::now(),
		}
	}

	fn line(product_id: &str, quantity: u32) -> CartItem {
		CartItem {
			product_id: product_id.to_string(),
			quantity,
		}
	}

	#[test]
	fn prices_lines_and_accumulates_total() {
		let resolved = vec![
			(line("p1", 2), product("p1", 150, Currency::Inr, 10)),
			(line("p2", 1), product("p2", 50, Currency::Inr, 3)),
		];
		let (items, total) = price_lines(&resolved).unwrap();

		assert_eq!(items.len(), 2);
		assert_eq!(items[0].price.amount, Decimal::from(300));
		assert_eq!(items[1].price.amount, Decimal::from(50));
		assert_eq!(total.amount, Decimal::from(350));
		assert_eq!(total.currency, Currency::Inr);
	}

	#[test]
	fn insufficient_stock_names_product_and_quantities() {
		let resolved = vec![(line("p1", 2), product("p1", 150, Currency::Inr, 1))];
		let err = price_lines(&resolved).unwrap_err();
		match err {
			CreateOrderError::InsufficientStock {
				product_id,
				requested,
				available,
				..
			} => {
				assert_eq!(product_id, "p1");
				assert_eq!(requested, 2);
				assert_eq!(available, 1);
			},
			other => panic!("unexpected error: {:?}", other),
		}
	}

	#[test]
	fn exact_stock_is_allowed() {
		let resolved = vec![(line("p1", 5), product("p1", 10, Currency::Usd, 5))];
		let (items, total) = price_lines(&resolved).unwrap();
		assert_eq!(items[0].quantity, 5);
		assert_eq!(total.amount, Decimal::from(50));
	}

	#[test]
	fn mixed_currencies_are_rejected() {
		let resolved = vec![
			(line("p1", 1), product("p1", 150, Currency::Inr, 10)),
			(line("p2", 1), product("p2", 20, Currency::Usd, 10)),
		];
		let err = price_lines(&resolved).unwrap_err();
		assert!(matches!(
			err,
			CreateOrderError::CurrencyMismatch(Currency::Inr, Currency::Usd)
		));
	}
}
