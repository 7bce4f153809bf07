//! Crate-level error types shared by the discovery engine, host resolution, and
//! the credentials layer.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical discovery error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The host answered, but outside the discovery protocol's contract.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),
	/// The requested service is not available from the host.
	#[error(transparent)]
	Lookup(#[from] LookupError),
	/// The manifest entry (or the query itself) is malformed.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Credentials lookup or storage failure.
	#[error(transparent)]
	Credentials(#[from] CredentialsError),
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: ReqwestError,
	},
	/// The well-known discovery URL could not be derived from the hostname.
	#[error("Failed to derive a discovery URL for host {host}.")]
	DiscoveryUrl {
		/// Normalized hostname that was being discovered.
		host: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The outgoing discovery request could not be built.
	#[error("Invalid discovery request.")]
	DiscoveryRequest {
		/// Underlying request builder failure.
		#[source]
		source: ReqwestError,
	},
}

/// Transport-level failures (network, IO).
///
/// Callers can reach the underlying [`ReqwestError`] through
/// [`std::error::Error::source`] to special-case network failures.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// The discovery request could not be dispatched or completed.
	#[error("Failed to request discovery document.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: ReqwestError,
	},
	/// The response body stream failed partway through.
	#[error("Failed to read discovery document body.")]
	Body {
		/// Transport-specific network error.
		#[source]
		source: ReqwestError,
	},
}
impl From<ReqwestError> for TransportError {
	fn from(source: ReqwestError) -> Self {
		Self::Network { source }
	}
}

/// Protocol violations in an otherwise-delivered discovery response.
///
/// None of these are retried; the response is discarded and nothing is cached.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
	/// The host responded with a status other than 200 or 404.
	#[error("Discovery document request returned unexpected status {status}.")]
	UnexpectedStatus {
		/// HTTP status code returned by the host.
		status: u16,
	},
	/// The `Content-Type` header could not be parsed as a media type.
	#[error("Discovery URL has a malformed Content-Type {content_type:?}.")]
	MalformedContentType {
		/// Raw header value as received.
		content_type: String,
	},
	/// The `Content-Type` header parsed to something other than `application/json`.
	#[error("Discovery URL returned an unsupported Content-Type {media_type:?}.")]
	UnsupportedContentType {
		/// Parsed media type, parameters stripped.
		media_type: String,
	},
	/// The declared or actual body size exceeds the document cap.
	#[error("Discovery document response is too large (limit {limit} bytes).")]
	ResponseTooLarge {
		/// Maximum accepted document size in bytes.
		limit: u64,
	},
	/// The body is not a single JSON object.
	#[error("Failed to decode discovery document as a JSON object.")]
	Decode {
		/// Structured parsing failure, including the offending JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Service lookup failures, structured for user-facing messages.
///
/// A host that supports no services at all and a host that supports other
/// services than the requested one produce the same "not provided" error, so
/// whole-host discovery details never leak to an end user.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum LookupError {
	/// The host's manifest has no entry for the service name.
	#[error("Host {host} does not provide a {service} service.")]
	ServiceNotProvided {
		/// Display form of the queried hostname.
		host: String,
		/// Service name from the queried identifier.
		service: String,
	},
	/// The host supports the service, but not the requested version.
	#[error("Host {host} does not support {service} version {version}.")]
	VersionNotSupported {
		/// Display form of the queried hostname.
		host: String,
		/// Service name from the queried identifier.
		service: String,
		/// Major version that was requested.
		version: u64,
	},
}

/// Validation failures for service identifiers and manifest entries.
///
/// Each variant names the offending service identifier so the message can be
/// surfaced to an end user without further context.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// The queried service identifier is not of the form `name.vN`.
	#[error(transparent)]
	ServiceId(#[from] crate::host::ServiceIdError),
	/// A URL was requested for an entry that is not a JSON string.
	#[error("Service {id} must be declared with a string value in the discovery document.")]
	NotAUrlValue {
		/// Offending service identifier.
		id: String,
	},
	/// An OAuth client was requested for an entry that is not a JSON object.
	#[error("Service {id} must be declared with an object value in the discovery document.")]
	NotAnObjectValue {
		/// Offending service identifier.
		id: String,
	},
	/// An OAuth descriptor lacks a property its grant types require.
	#[error("Service {id} definition is missing required property {property:?}.")]
	MissingProperty {
		/// Offending service identifier.
		id: String,
		/// Name of the missing descriptor property.
		property: &'static str,
	},
	/// The descriptor's `grant_types` property is not an array.
	#[error(
		"Service {id} is defined with an invalid grant_types property: must be an array of grant type strings."
	)]
	InvalidGrantTypes {
		/// Offending service identifier.
		id: String,
	},
	/// A service or endpoint URL failed the URL-resolution rule.
	#[error("Failed to parse {endpoint} URL for service {id}.")]
	EndpointUrl {
		/// Offending service identifier.
		id: String,
		/// Which URL failed: `service`, `authorization`, or `token`.
		endpoint: &'static str,
		/// Underlying resolution failure.
		#[source]
		source: crate::host::UrlResolveError,
	},
	/// The descriptor's `ports` property is not a two-element array.
	#[error("Invalid ports definition for service {id}: must be a two-element array.")]
	PortsNotAPair {
		/// Offending service identifier.
		id: String,
	},
	/// One or both ports are not whole numbers within the permitted range.
	#[error(
		"Invalid ports definition for service {id}: both ports must be whole numbers between 1024 and 65535."
	)]
	InvalidPorts {
		/// Offending service identifier.
		id: String,
	},
	/// The minimum port exceeds the maximum port.
	#[error(
		"Invalid ports definition for service {id}: minimum port cannot be greater than maximum port."
	)]
	PortRangeInverted {
		/// Offending service identifier.
		id: String,
	},
	/// The descriptor's `scopes` array contains a non-string element.
	#[error("Invalid scopes for service {id}: all scopes must be strings.")]
	InvalidScopes {
		/// Offending service identifier.
		id: String,
	},
}

/// Error type produced by credentials sources and stores.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CredentialsError {
	/// A store or forget operation was attempted without a backing store.
	#[error("No credentials store is available.")]
	NoStore,
	/// Backend-level failure from a custom credentials source.
	#[error("Credentials backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;

	#[test]
	fn transport_error_exposes_underlying_cause() {
		let reqwest_error = reqwest::Client::new()
			.get("http://\u{0}")
			.build()
			.expect_err("Control character in URL should fail request construction.");
		let error: Error = TransportError::Network { source: reqwest_error }.into();

		assert!(matches!(error, Error::Transport(_)));
		assert!(
			StdError::source(&error).is_some(),
			"Transport errors should expose the reqwest cause as their source.",
		);
	}

	#[test]
	fn lookup_errors_format_for_end_users() {
		let not_provided = LookupError::ServiceNotProvided {
			host: "example.com".into(),
			service: "thingy".into(),
		};

		assert_eq!(not_provided.to_string(), "Host example.com does not provide a thingy service.");

		let unsupported = LookupError::VersionNotSupported {
			host: "example.com".into(),
			service: "thingy".into(),
			version: 1,
		};

		assert_eq!(
			unsupported.to_string(),
			"Host example.com does not support thingy version 1.",
		);
	}
}
