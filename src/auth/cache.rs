//! Per-hostname memoization decorator for credentials sources.

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

/// Wraps another source and caches its results in memory, per hostname.
///
/// Both credentials and "no credentials" responses are cached; errors are not,
/// so a failing lookup can be retried. No expiration is provided, so a caching
/// source should have a limited lifetime (one logical operation, for example)
/// to keep time-limited credentials from outliving their cache entries.
///
/// Store and forget forward to the wrapped source and fail with
/// [`CredentialsError::NoStore`] when it is not a store; either way the
/// hostname's cache entry is evicted first, so a later read re-queries the real
/// store even if the store call itself failed.
pub struct CachingCredentialsSource {
	source: Arc<dyn CredentialsSource>,
	cache: Mutex<HashMap<Hostname, Option<HostCredentialsHandle>>>,
}
impl CachingCredentialsSource {
	/// Wraps the given source with a fresh, empty cache.
	pub fn new(source: Arc<dyn CredentialsSource>) -> Self {
		Self { source, cache: Mutex::new(HashMap::new()) }
	}

	/// Wraps a source that is statically known to be a store, so the
	/// store-specific methods are guaranteed to delegate rather than fail.
	pub fn for_store<S>(store: Arc<S>) -> Self
	where
		S: CredentialsStore + 'static,
	{
		Self::new(store)
	}
}
impl CredentialsSource for CachingCredentialsSource {
	fn for_host<'a>(
		&'a self,
		host: &'a Hostname,
	) -> CredentialsFuture<'a, Option<HostCredentialsHandle>> {
		Box::pin(async move {
			let cached = self.cache.lock().get(host).cloned();

			if let Some(credentials) = cached {
				return Ok(credentials);
			}

			let result = self.source.for_host(host).await?;

			self.cache.lock().insert(host.clone(), result.clone());

			Ok(result)
		})
	}

	fn as_store(&self) -> Option<&dyn CredentialsStore> {
		Some(self)
	}
}
impl CredentialsStore for CachingCredentialsSource {
	fn store_for_host<'a>(
		&'a self,
		host: &'a Hostname,
		credentials: &'a dyn NewHostCredentials,
	) -> CredentialsFuture<'a, ()> {
		Box::pin(async move {
			self.cache.lock().remove(host);

			self.source
				.as_store()
				.ok_or(CredentialsError::NoStore)?
				.store_for_host(host, credentials)
				.await
		})
	}

	fn forget_for_host<'a>(&'a self, host: &'a Hostname) -> CredentialsFuture<'a, ()> {
		Box::pin(async move {
			self.cache.lock().remove(host);

			self.source.as_store().ok_or(CredentialsError::NoStore)?.forget_for_host(host).await
		})
	}
}
