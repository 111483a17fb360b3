//! Offset pagination with an enforced page-size ceiling.

use serde::{Deserialize, Serialize};

/// Hard ceiling on page size, applied everywhere a limit is accepted.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Default page size when the caller does not supply one.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Query parameters for paginated listings.
///
/// Values are deserialized leniently: absent or non-numeric input falls back
/// to the defaults rather than failing the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
	#[serde(default, deserialize_with = "lenient_u64")]
	pub page: Option<u64>,
	#[serde(default, deserialize_with = "lenient_u64")]
	pub limit: Option<u64>,
}

impl PageQuery {
	/// Resolves the query into a concrete `(page, limit, skip)` triple.
	///
	/// Page numbers start at 1; the limit is clamped to [`MAX_PAGE_SIZE`].
	pub fn resolve(&self) -> Page {
		let page = self.page.filter(|p| *p >= 1).unwrap_or(1);
		let limit = self
			.limit
			.filter(|l| *l >= 1)
			.unwrap_or(DEFAULT_PAGE_SIZE)
			.min(MAX_PAGE_SIZE);
		Page {
			page,
			limit,
			skip: (page - 1) * limit,
		}
	}
}

/// A resolved pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
	pub page: u64,
	pub limit: u64,
	pub skip: u64,
}

/// Pagination metadata returned alongside listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
	pub page: u64,
	pub limit: u64,
	/// Total matching records, before the window is applied.
	pub total: u64,
}

/// Raw skip/limit window, used by listings that never grew page numbers.
/// Same leniency and clamping rules as [`PageQuery`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkipQuery {
	#[serde(default, deserialize_with = "lenient_u64")]
	pub skip: Option<u64>,
	#[serde(default, deserialize_with = "lenient_u64")]
	pub limit: Option<u64>,
}

impl SkipQuery {
	/// Resolves into a concrete `(skip, limit)` pair with the limit
	/// clamped to [`MAX_PAGE_SIZE`].
	pub fn resolve(&self) -> (u64, u64) {
		let skip = self.skip.unwrap_or(0);
		let limit = self
			.limit
			.filter(|l| *l >= 1)
			.unwrap_or(DEFAULT_PAGE_SIZE)
			.min(MAX_PAGE_SIZE);
		(skip, limit)
	}
}

// Accepts numbers, numeric strings, or garbage (→ None) so that
// `?page=abc` degrades to the default instead of a 400.
fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
	D: serde::Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Raw {
		Num(u64),
		Text(String),
	}

	Ok(match Option::<Raw>::deserialize(deserializer)? {
		Some(Raw::Num(n)) => Some(n),
		Some(Raw::Text(s)) => s.trim().parse().ok(),
		None => None,
	})
}
