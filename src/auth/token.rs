//! Bearer-token credentials, the built-in [`HostCredentials`] variant.

// crates.io
use reqwest::header::{AUTHORIZATION, HeaderValue};
// self
use crate::{
	_prelude::*,
	auth::{HostCredentials, NewHostCredentials},
};

/// A single bearer token, sent as `Authorization: Bearer <token>`.
///
/// Also implements [`NewHostCredentials`], serializing as `{"token": <token>}`
/// so the value can round-trip through a credentials store.
#[derive(Clone, PartialEq, Eq)]
pub struct HostCredentialsToken(String);
impl HostCredentialsToken {
	/// Wraps the given token string.
	pub fn new(token: impl Into<String>) -> Self {
		Self(token.into())
	}

	/// Returns the authentication token.
	pub fn token(&self) -> &str {
		&self.0
	}
}
impl From<String> for HostCredentialsToken {
	fn from(token: String) -> Self {
		Self(token)
	}
}
impl From<&str> for HostCredentialsToken {
	fn from(token: &str) -> Self {
		Self(token.to_owned())
	}
}
impl Debug for HostCredentialsToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("HostCredentialsToken(REDACTED)")
	}
}
impl HostCredentials for HostCredentialsToken {
	fn prepare_request(&self, request: &mut Request) {
		// A token that cannot be encoded as a header value is unusable; the
		// request stays anonymous rather than carrying a mangled header.
		let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.0)) else {
			return;
		};

		request.headers_mut().insert(AUTHORIZATION, value);
	}
}
impl NewHostCredentials for HostCredentialsToken {
	fn to_store(&self) -> JsonValue {
		serde_json::json!({ "token": self.0 })
	}
}
