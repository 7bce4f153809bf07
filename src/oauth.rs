//! OAuth 2.0 client descriptors published through the discovery manifest.
//!
//! This crate only derives client configuration from a host's manifest; it does
//! not perform any OAuth flow. The grant-type set is deliberately open-ended so
//! manifests can introduce new keywords without breaking older clients.

// self
use crate::{_prelude::*, error::ValidationError};

/// Grant keyword for the authorization-code flow, the default when a
/// descriptor omits `grant_types`.
pub const GRANT_AUTHZ_CODE: &str = "authz_code";
/// Grant keyword for the resource-owner password flow, the only keyword that
/// does not require an authorization endpoint.
pub const GRANT_PASSWORD: &str = "password";

const MIN_PORT: u64 = 1024;
const MAX_PORT: u64 = 65535;

/// OAuth client configuration resolved from a manifest entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthClient {
	/// Public client identifier assigned by the host.
	pub id: String,
	/// Authorization endpoint, absent only when no configured grant needs one.
	pub authorization_url: Option<Url>,
	/// Token endpoint, absent only when no configured grant needs one.
	pub token_url: Option<Url>,
	/// Lowest local callback port the host allows.
	pub min_port: u16,
	/// Highest local callback port the host allows.
	pub max_port: u16,
	/// Grant keywords the host supports for this client.
	pub grant_types: OAuthGrantTypeSet,
	/// Scopes to request, in manifest order; absent when the manifest lists none.
	pub scopes: Option<Vec<String>>,
}

/// Set of free-form OAuth grant keywords.
///
/// Unknown keywords are preserved but not otherwise interpreted, so a manifest
/// can advertise grants this crate has never heard of.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OAuthGrantTypeSet(BTreeSet<String>);
impl OAuthGrantTypeSet {
	/// Builds a set from the given keywords.
	pub fn new<I, S>(keywords: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self(keywords.into_iter().map(Into::into).collect())
	}

	/// Returns the implied default set, a lone [`GRANT_AUTHZ_CODE`].
	pub fn authz_code() -> Self {
		Self::new([GRANT_AUTHZ_CODE])
	}

	/// Checks whether the set contains the given keyword.
	pub fn contains(&self, keyword: &str) -> bool {
		self.0.contains(keyword)
	}

	/// Returns true when no keywords are present.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates the keywords in sorted order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}

	/// Whether a client with these grants needs an authorization endpoint.
	///
	/// Every keyword demands one except [`GRANT_PASSWORD`], which exchanges
	/// resource-owner credentials directly at the token endpoint.
	pub fn requires_authorization_endpoint(&self) -> bool {
		self.0.iter().any(|keyword| keyword != GRANT_PASSWORD)
	}

	/// Whether a client with these grants needs a token endpoint.
	pub fn requires_token_endpoint(&self) -> bool {
		!self.0.is_empty()
	}
}
impl<S> FromIterator<S> for OAuthGrantTypeSet
where
	S: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		Self::new(iter)
	}
}

/// Decodes a descriptor's `grant_types` property.
///
/// Absent yields the [`OAuthGrantTypeSet::authz_code`] default. Non-string
/// array entries are skipped so future manifests can mix richer shapes into the
/// array; a non-array value is rejected outright.
pub(crate) fn decode_grant_types(
	id: &str,
	value: Option<&JsonValue>,
) -> Result<OAuthGrantTypeSet, ValidationError> {
	match value {
		None => Ok(OAuthGrantTypeSet::authz_code()),
		Some(JsonValue::Array(entries)) =>
			Ok(entries.iter().filter_map(JsonValue::as_str).collect()),
		Some(_) => Err(ValidationError::InvalidGrantTypes { id: id.to_owned() }),
	}
}

/// Decodes a descriptor's `ports` property into an inclusive `(min, max)` pair.
///
/// An absent value (or one that is not an array at all) yields the full
/// `1024..=65535` range.
pub(crate) fn decode_ports(
	id: &str,
	value: Option<&JsonValue>,
) -> Result<(u16, u16), ValidationError> {
	let Some(JsonValue::Array(entries)) = value else {
		return Ok((MIN_PORT as u16, MAX_PORT as u16));
	};
	let [min, max] = entries.as_slice() else {
		return Err(ValidationError::PortsNotAPair { id: id.to_owned() });
	};
	let (Some(min), Some(max)) = (decode_port(min), decode_port(max)) else {
		return Err(ValidationError::InvalidPorts { id: id.to_owned() });
	};

	if max < min {
		return Err(ValidationError::PortRangeInverted { id: id.to_owned() });
	}

	Ok((min, max))
}

/// Decodes one port value, tolerating the numeric representations different
/// decoders produce (integers, or whole-valued floats).
fn decode_port(value: &JsonValue) -> Option<u16> {
	let port = value.as_u64().or_else(|| {
		let float = value.as_f64()?;

		(float.fract() == 0.0 && (0.0..=MAX_PORT as f64).contains(&float)).then_some(float as u64)
	})?;

	(MIN_PORT..=MAX_PORT).contains(&port).then_some(port as u16)
}

/// Decodes a descriptor's `scopes` property.
///
/// Every element must be a string; an empty array yields an absent result
/// rather than an empty-but-present list. A value that is not an array at all
/// is ignored.
pub(crate) fn decode_scopes(
	id: &str,
	value: Option<&JsonValue>,
) -> Result<Option<Vec<String>>, ValidationError> {
	let Some(JsonValue::Array(entries)) = value else {
		return Ok(None);
	};
	let scopes = entries
		.iter()
		.map(|entry| entry.as_str().map(str::to_owned))
		.collect::<Option<Vec<_>>>()
		.ok_or_else(|| ValidationError::InvalidScopes { id: id.to_owned() })?;

	if scopes.is_empty() { Ok(None) } else { Ok(Some(scopes)) }
}
