//! Ordered first-match composition of credentials sources.

// self
use crate::{
	_prelude::*,
	auth::{
		CredentialsFuture, CredentialsSource, CredentialsStore, HostCredentialsHandle,
		NewHostCredentials,
	},
	error::CredentialsError,
	hostname::Hostname,
};

/// A list of [`CredentialsSource`] objects tried in turn until one returns
/// credentials for a host, or one returns an error.
///
/// A `Credentials` is itself a `CredentialsSource`, wrapping its members, and
/// also exposes store/forget by forwarding to the first member when that member
/// is a store; otherwise those operations fail with
/// [`CredentialsError::NoStore`].
#[derive(Clone, Default)]
pub struct Credentials(Vec<Arc<dyn CredentialsSource>>);
impl Credentials {
	/// Builds a chain over the given sources, first match winning.
	pub fn new(sources: Vec<Arc<dyn CredentialsSource>>) -> Self {
		Self(sources)
	}

	/// Returns an empty chain that always answers "no credentials".
	pub fn none() -> Self {
		Self::default()
	}

	/// Appends a source at the end of the chain.
	pub fn push(&mut self, source: Arc<dyn CredentialsSource>) {
		self.0.push(source);
	}

	fn store(&self) -> Option<&dyn CredentialsStore> {
		self.0.first()?.as_store()
	}
}
impl CredentialsSource for Credentials {
	fn for_host<'a>(
		&'a self,
		host: &'a Hostname,
	) -> CredentialsFuture<'a, Option<HostCredentialsHandle>> {
		Box::pin(async move {
			for source in &self.0 {
				if let Some(credentials) = source.for_host(host).await? {
					return Ok(Some(credentials));
				}
			}

			Ok(None)
		})
	}

	fn as_store(&self) -> Option<&dyn CredentialsStore> {
		Some(self)
	}
}
impl CredentialsStore for Credentials {
	fn store_for_host<'a>(
		&'a self,
		host: &'a Hostname,
		credentials: &'a dyn NewHostCredentials,
	) -> CredentialsFuture<'a, ()> {
		Box::pin(async move {
			self.store().ok_or(CredentialsError::NoStore)?.store_for_host(host, credentials).await
		})
	}

	fn forget_for_host<'a>(&'a self, host: &'a Hostname) -> CredentialsFuture<'a, ()> {
		Box::pin(async move {
			self.store().ok_or(CredentialsError::NoStore)?.forget_for_host(host).await
		})
	}
}
