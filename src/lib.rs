//! Rust's turnkey service discovery client—map well-known hostnames to versioned
//! service endpoints, OAuth 2.0 client descriptors, and credential-aware
//! discovery requests in one crate built for production.
//!
//! The entry point is [`disco::Disco`]: it fetches a host's discovery manifest
//! from `https://<host>/.well-known/terraform.json`, caches the resulting
//! [`host::Host`] per hostname, and answers typed queries such as "the URL for
//! service `x.v1`" or "the OAuth client configuration for service `y.v2`".
//! Credentials attached to discovery requests come from the composable sources
//! in [`auth`].

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod disco;
pub mod error;
pub mod host;
pub mod hostname;
pub mod oauth;
pub mod obs;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via
	//! `cfg(test)` or the `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::disco::Disco;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates
	/// produced by `httpmock` during tests.
	pub fn test_http_client() -> ReqwestClient {
		ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.")
	}

	/// Constructs a [`Disco`] backed by the insecure test client.
	pub fn build_test_disco() -> Disco {
		Disco::builder()
			.http_client(test_http_client())
			.build()
			.expect("Failed to build Disco engine for tests.")
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeSet, HashMap},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError, Request};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map as JsonMap, Value as JsonValue};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
