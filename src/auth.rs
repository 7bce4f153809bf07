//! Credentials capabilities consumed by the discovery engine.
//!
//! The capability surface is three small traits: [`HostCredentials`] mutates an
//! outgoing request to carry authentication, [`CredentialsSource`] looks
//! credentials up per hostname, and [`CredentialsStore`] extends a source with
//! save/forget. Composition lives in [`Credentials`] (ordered first-match
//! chain) and [`CachingCredentialsSource`] (per-hostname memo table).

pub mod cache;
pub mod chain;
pub mod static_source;
pub mod token;

pub use cache::CachingCredentialsSource;
pub use chain::Credentials;
pub use static_source::{StaticCredentialsSource, host_credentials_from_object};
pub use token::HostCredentialsToken;

// self
use crate::{_prelude::*, error::CredentialsError, hostname::Hostname};

/// Shared handle to one host's credentials.
pub type HostCredentialsHandle = Arc<dyn HostCredentials>;

/// Boxed future returned by credentials sources and stores.
pub type CredentialsFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, CredentialsError>> + 'a + Send>>;

/// A single set of credentials for a particular host.
pub trait HostCredentials
where
	Self: Send + Sync + Debug,
{
	/// Modifies the given request in place to apply the receiving credentials.
	///
	/// The usual behavior is to add some sort of `Authorization` header, but
	/// the contract is flexible enough for more esoteric schemes such as
	/// presigned URLs where a signature lands in the query string.
	/// Implementations must not alter parts of the request unrelated to
	/// authentication.
	fn prepare_request(&self, request: &mut Request);
}

/// New credentials that can be saved in a [`CredentialsStore`].
pub trait NewHostCredentials
where
	Self: Send + Sync,
{
	/// Returns a JSON object representing this credential for persistent
	/// storage.
	fn to_store(&self) -> JsonValue;
}

/// An object that may be able to provide credentials for a given host.
///
/// Lookups are not required to be concurrency-safe internally; composition and
/// caching layers add that.
pub trait CredentialsSource
where
	Self: Send + Sync,
{
	/// Returns credentials for the host, or `None` if the source has none.
	///
	/// An error halts progress through a [`Credentials`] chain and is returned
	/// to the caller.
	fn for_host<'a>(
		&'a self,
		host: &'a Hostname,
	) -> CredentialsFuture<'a, Option<HostCredentialsHandle>>;

	/// Returns the store capability when this source also persists credentials.
	fn as_store(&self) -> Option<&dyn CredentialsStore> {
		None
	}
}

/// Extension of [`CredentialsSource`] that can also save and discard
/// credentials.
pub trait CredentialsStore
where
	Self: CredentialsSource,
{
	/// Saves the given credentials as the credentials for the host, replacing
	/// any that were stored before.
	fn store_for_host<'a>(
		&'a self,
		host: &'a Hostname,
		credentials: &'a dyn NewHostCredentials,
	) -> CredentialsFuture<'a, ()>;

	/// Discards any stored credentials for the host; succeeds when none exist.
	fn forget_for_host<'a>(&'a self, host: &'a Hostname) -> CredentialsFuture<'a, ()>;
}
