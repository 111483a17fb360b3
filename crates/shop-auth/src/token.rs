//! HS256 bearer-token issuance and verification.
//!
//! Tokens are standard three-segment JWTs signed with HMAC-SHA256. The
//! codec owns the signing secret for its whole lifetime; it is constructed
//! once at startup from configuration and shared behind an `Arc`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use shop_types::{Role, SecretString};
use std::time::Duration;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Errors that can occur while verifying a token.
#[derive(Debug, Error)]
pub enum TokenError {
	/// Token does not have the `header.payload.signature` shape.
	#[error("Malformed token")]
	Malformed,
	/// Signature does not match the payload.
	#[error("Invalid signature")]
	InvalidSignature,
	/// Token expiry is in the past.
	#[error("Token expired")]
	Expired,
}

/// Claims carried by a signed credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
	/// Subject: the user id.
	pub sub: String,
	pub username: String,
	pub role: Role,
	/// Issued-at, Unix seconds.
	pub iat: i64,
	/// Expiry, Unix seconds.
	pub exp: i64,
}

/// HS256 signer/verifier for bearer tokens.
pub struct TokenCodec {
	secret: SecretString,
	expiry: Duration,
}

impl TokenCodec {
	/// Creates a codec with the given signing secret and token lifetime.
	pub fn new(secret: SecretString, expiry: Duration) -> Self {
		Self { secret, expiry }
	}

	/// Issues a signed token for the given identity.
	pub fn issue(&self, user_id: &str, username: &str, role: Role) -> String {
		let now = Utc::now().timestamp();
		let claims = Claims {
			sub: user_id.to_string(),
			username: username.to_string(),
			role,
			iat: now,
			exp: now + self.expiry.as_secs() as i64,
		};
		self.sign(&claims)
	}

	fn sign(&self, claims: &Claims) -> String {
		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
		// Claims is a closed struct; serialization cannot fail.
		let payload =
			URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap_or_default());
		let signing_input = format!("{}.{}", header, payload);
		let signature = URL_SAFE_NO_PAD.encode(self.mac(signing_input.as_bytes()));
		format!("{}.{}", signing_input, signature)
	}

	/// Verifies a token's structure, signature, and expiry.
	pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
		let mut segments = token.split('.');
		let (Some(header), Some(payload), Some(signature), None) = (
			segments.next(),
			segments.next(),
			segments.next(),
			segments.next(),
		) else {
			return Err(TokenError::Malformed);
		};

		let signing_input = format!("{}.{}", header, payload);
		let expected = self.mac(signing_input.as_bytes());
		let presented = URL_SAFE_NO_PAD
			.decode(signature)
			.map_err(|_| TokenError::Malformed)?;
		if !constant_time_eq(&expected, &presented) {
			return Err(TokenError::InvalidSignature);
		}

		let payload_bytes = URL_SAFE_NO_PAD
			.decode(payload)
			.map_err(|_| TokenError::Malformed)?;
		let claims: Claims =
			serde_json::from_slice(&payload_bytes).map_err(|_| TokenError::Malformed)?;

		if claims.exp <= Utc::now().timestamp() {
			return Err(TokenError::Expired);
		}
		Ok(claims)
	}

	fn mac(&self, input: &[u8]) -> Vec<u8> {
		// HMAC accepts keys of any length; new_from_slice cannot fail.
		let mut mac = HmacSha256::new_from_slice(self.secret.expose().as_bytes())
			.expect("HMAC accepts any key length");
		mac.update(input);
		mac.finalize().into_bytes().to_vec()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn codec() -> TokenCodec {
		TokenCodec::new(
			SecretString::from("unit-test-secret"),
			Duration::from_secs(3600),
		)
	}

	#[test]
	fn issued_tokens_verify() {
		let codec = codec();
		let token = codec.issue("u-1", "asha", Role::User);
		let claims = codec.verify(&token).unwrap();
		assert_eq!(claims.sub, "u-1");
		assert_eq!(claims.username, "asha");
		assert_eq!(claims.role, Role::User);
		assert!(claims.exp > claims.iat);
	}

	#[test]
	fn tampered_payload_is_rejected() {
		let codec = codec();
		let token = codec.issue("u-1", "asha", Role::User);

		// Swap the payload for one claiming a different subject.
		let mut parts: Vec<&str> = token.split('.').collect();
		let forged = URL_SAFE_NO_PAD.encode(
			br#"{"sub":"u-2","username":"mallory","role":"admin","iat":0,"exp":9999999999}"#,
		);
		parts[1] = &forged;
		let forged_token = parts.join(".");

		assert!(matches!(
			codec.verify(&forged_token),
			Err(TokenError::InvalidSignature)
		));
	}

	#[test]
	fn wrong_secret_is_rejected() {
		let token = codec().issue("u-1", "asha", Role::User);
		let other = TokenCodec::new(SecretString::from("other"), Duration::from_secs(3600));
		assert!(matches!(
			other.verify(&token),
			Err(TokenError::InvalidSignature)
		));
	}

	#[test]
	fn expired_tokens_are_rejected() {
		let codec = TokenCodec::new(SecretString::from("unit-test-secret"), Duration::ZERO);
		let token = codec.issue("u-1", "asha", Role::User);
		assert!(matches!(codec.verify(&token), Err(TokenError::Expired)));
	}

	#[test]
	fn garbage_is_malformed() {
		let codec = codec();
		assert!(matches!(codec.verify("not-a-token"), Err(TokenError::Malformed)));
		assert!(matches!(codec.verify("a.b.c.d"), Err(TokenError::Malformed)));
	}
}
