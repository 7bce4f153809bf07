//! Map-backed [`CredentialsSource`] for fixed per-host credentials.

// self
use crate::{
	_prelude::*,
	auth::{CredentialsFuture, CredentialsSource, HostCredentialsHandle, HostCredentialsToken},
	hostname::Hostname,
};

/// A credentials source that looks up hosts in a fixed map.
///
/// Useful for credentials supplied through configuration. The source never
/// errors; hosts absent from the map simply have no credentials.
#[derive(Clone, Default)]
pub struct StaticCredentialsSource(HashMap<Hostname, HostCredentialsHandle>);
impl StaticCredentialsSource {
	/// Wraps the given per-host credentials map.
	pub fn new(credentials: HashMap<Hostname, HostCredentialsHandle>) -> Self {
		Self(credentials)
	}

	/// Builds a source from stored credential objects, skipping entries whose
	/// shape [`host_credentials_from_object`] does not recognize.
	pub fn from_stored(stored: HashMap<Hostname, JsonValue>) -> Self {
		Self(
			stored
				.into_iter()
				.filter_map(|(host, value)| {
					let object = value.as_object()?;

					Some((host, host_credentials_from_object(object)?))
				})
				.collect(),
		)
	}
}
impl CredentialsSource for StaticCredentialsSource {
	fn for_host<'a>(
		&'a self,
		host: &'a Hostname,
	) -> CredentialsFuture<'a, Option<HostCredentialsHandle>> {
		Box::pin(async move { Ok(self.0.get(host).cloned()) })
	}
}

/// Decodes a stored credentials object back into usable credentials.
///
/// Currently the only recognized shape is the bearer-token object written by
/// [`HostCredentialsToken`]'s store representation, `{"token": <token>}`.
/// Unrecognized shapes yield `None` so richer credential objects can be added
/// later without breaking older stores.
pub fn host_credentials_from_object(
	object: &JsonMap<String, JsonValue>,
) -> Option<HostCredentialsHandle> {
	let token = object.get("token")?.as_str()?;

	Some(Arc::new(HostCredentialsToken::new(token)))
}
