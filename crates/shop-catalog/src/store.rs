//! Persisted product collection with in-store filtering.

use rust_decimal::Decimal;
use shop_storage::{StorageError, StorageService};
use shop_types::Product;

const NAMESPACE: &str = "products";

/// Filter criteria for catalog listings.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
	/// Case-insensitive substring match on title or description.
	pub query: Option<String>,
	pub min_price: Option<Decimal>,
	pub max_price: Option<Decimal>,
}

impl ProductFilter {
	fn matches(&self, product: &Product) -> bool {
		if let Some(query) = &self.query {
			let needle = query.to_lowercase();
			if !product.title.to_lowercase().contains(&needle)
				&& !product.description.to_lowercase().contains(&needle)
			{
				return false;
			}
		}
		if let Some(min) = self.min_price {
			if product.price.amount < min {
				return false;
			}
		}
		if let Some(max) = self.max_price {
			if product.price.amount > max {
				return false;
			}
		}
		true
	}
}

/// Typed access to the product collection.
pub struct ProductStore {
	storage: StorageService,
}

impl ProductStore {
	pub fn new(storage: StorageService) -> Self {
		Self { storage }
	}

	pub async fn insert(&self, product: &Product) -> Result<(), StorageError> {
		self.storage.insert(NAMESPACE, &product.id, product).await
	}

	pub async fn get(&self, product_id: &str) -> Result<Product, StorageError> {
		self.storage.retrieve(NAMESPACE, product_id).await
	}

	pub async fn put(&self, product: &Product) -> Result<(), StorageError> {
		self.storage.update(NAMESPACE, &product.id, product).await
	}

	pub async fn delete(&self, product_id: &str) -> Result<(), StorageError> {
		self.storage.remove(NAMESPACE, product_id).await
	}

	/// Filtered listing in id order, windowed by skip/limit.
	pub async fn list(
		&self,
		filter: &ProductFilter,
		skip: u64,
		limit: u64,
	) -> Result<Vec<Product>, StorageError> {
		let products: Vec<Product> = self.storage.retrieve_all(NAMESPACE).await?;
		Ok(products
			.into_iter()
			.filter(|product| filter.matches(product))
			.skip(skip as usize)
			.take(limit as usize)
			.collect())
	}

	/// All products listed by one seller, windowed by skip/limit.
	pub async fn list_by_seller(
		&self,
		seller: &str,
		skip: u64,
		limit: u64,
	) -> Result<Vec<Product>, StorageError> {
		let products: Vec<Product> = self.storage.retrieve_all(NAMESPACE).await?;
		Ok(products
			.into_iter()
			.filter(|product| product.seller == seller)
			.skip(skip as usize)
			.take(limit as usize)
			.collect())
	}
}
