//! User entity, roles, and postal addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Roles a credential can carry.
///
/// Role gating happens at the HTTP boundary: regular shoppers are `User`,
/// catalog writers are `Seller`, and `Admin` may additionally read any
/// order by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	User,
	Seller,
	Admin,
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Role::User => write!(f, "user"),
			Role::Seller => write!(f, "seller"),
			Role::Admin => write!(f, "admin"),
		}
	}
}

/// A user's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullName {
	pub first_name: String,
	pub last_name: String,
}

/// A postal address.
///
/// `pincode` is the single postal-code field; the legacy `zipCode` spelling
/// is accepted on input as an alias and normalized here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
	pub street: String,
	pub city: String,
	pub state: String,
	pub country: String,
	#[serde(alias = "zipCode")]
	pub pincode: String,
	pub phone: String,
}

/// An entry in a user's address book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressBookEntry {
	/// Identifier of this entry within the user's address book.
	pub id: String,
	#[serde(flatten)]
	pub address: Address,
	/// Whether this entry is the user's default shipping address.
	#[serde(default)]
	pub is_default: bool,
}

/// A registered user.
///
/// The password hash lives here because the identity service owns the user
/// collection, but it is never serialized outward: handlers respond with
/// [`UserProfile`] instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	pub id: String,
	pub username: String,
	pub email: String,
	pub full_name: FullName,
	pub role: Role,
	/// Stored password verifier, in the identity service's hash format.
	pub password_hash: String,
	#[serde(default)]
	pub addresses: Vec<AddressBookEntry>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// The outward-facing projection of a user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
	pub id: String,
	pub username: String,
	pub email: String,
	pub full_name: FullName,
	pub role: Role,
}

impl From<&User> for UserProfile {
	fn from(user: &User) -> Self {
		Self {
			id: user.id.clone(),
			username: user.username.clone(),
			email: user.email.clone(),
			full_name: user.full_name.clone(),
			role: user.role,
		}
	}
}
