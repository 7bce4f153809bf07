//! Discovery engine: network discovery, hostname aliasing, and per-host
//! result caching.

// crates.io
use reqwest::{
	Response, StatusCode,
	header::{ACCEPT, CONTENT_TYPE},
	redirect::Policy,
};
// self
use crate::{
	_prelude::*,
	auth::{Credentials, CredentialsSource, HostCredentialsHandle},
	error::{ConfigError, ProtocolError, TransportError},
	host::{Host, ServiceMap},
	hostname::Hostname,
	obs::{DiscoveryOutcome, DiscoverySpan, DiscoveryTrace, NoopTrace, record_discovery_outcome},
};

/// Fixed path to the discovery manifest. This is an IANA-registered name
/// shared with the protocol's originating products, so vendors can support all
/// of them simultaneously.
const DISCO_PATH: &str = "/.well-known/terraform.json";
/// Arbitrary-but-small redirect bound applied only to the default client.
const MAX_REDIRECTS: usize = 3;
/// Arbitrary-but-small time limit applied only to the default client, so
/// interactive callers never hang on discovery.
const DISCO_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(11);
/// 1 MiB document cap, so abusive services cannot exhaust memory.
const MAX_DISCO_DOC_BYTES: u64 = 1024 * 1024;

/// The discovery engine: runs the discovery protocol against hostnames and
/// caches the results per hostname to avoid repeated requests for the same
/// information.
///
/// Instances are explicitly constructed and caller-owned; there is no implicit
/// process-wide engine. Cached entries never expire on their own and are only
/// invalidated through [`Disco::forget`] and its siblings, so an instance
/// should live for one logical operation or session.
///
/// Concurrent [`Disco::discover`] calls for the same uncached hostname are not
/// deduplicated: each may perform its own network request, and the cache keeps
/// whichever result is written last. Discovery results are assumed stable over
/// such short windows.
pub struct Disco {
	// Must lock while interacting with these maps; the lock is never held
	// across network I/O.
	aliases: Mutex<HashMap<Hostname, Hostname>>,
	host_cache: Mutex<HashMap<Hostname, Arc<Host>>>,
	credentials: Option<Arc<dyn CredentialsSource>>,
	trace: Arc<dyn DiscoveryTrace>,
	http: ReqwestClient,
}
impl Disco {
	/// Creates an engine with the default HTTP client and no credentials.
	pub fn new() -> Result<Self> {
		Self::builder().build()
	}

	/// Returns a builder for configuring the HTTP client, credentials source,
	/// and trace observer.
	pub fn builder() -> DiscoBuilder {
		DiscoBuilder::default()
	}

	/// Replaces the credentials source used for outgoing discovery requests.
	pub fn set_credentials_source(&mut self, source: Arc<dyn CredentialsSource>) {
		self.credentials = Some(source);
	}

	/// Returns the configured credentials source, or an empty chain when none
	/// is configured, saving callers from handling the absent case themselves.
	pub fn credentials_source(&self) -> Arc<dyn CredentialsSource> {
		self.credentials.clone().unwrap_or_else(|| Arc::new(Credentials::none()))
	}

	/// Returns credentials for the host (or its alias target), or `None` when
	/// no credentials source is configured or the source has none.
	pub async fn credentials_for_host(
		&self,
		hostname: &Hostname,
	) -> Result<Option<HostCredentialsHandle>> {
		let hostname = self.resolve_alias(hostname);

		self.lookup_credentials(&hostname).await
	}

	/// Registers a one-hop alias: discovery and credentials lookups for
	/// `alias` consult `target` instead. An alias pointing at another alias is
	/// not followed further.
	pub fn alias(&self, alias: Hostname, target: Hostname) {
		self.aliases.lock().insert(alias, target);
	}

	/// Provides a pre-defined set of services for the given host, preventing
	/// network discovery for it until the entry is forgotten.
	///
	/// Relative URLs in `services` resolve against the same well-known
	/// location network discovery would have used, yielding the same results
	/// as if the map were published there. Absolute URLs are still strongly
	/// recommended to make the configured behavior explicit.
	pub fn force_host_services(&self, hostname: Hostname, services: ServiceMap) -> Result<()> {
		let disco_url = discovery_url(&hostname)?;
		let host =
			Arc::new(Host::new(disco_url, hostname.for_display().to_owned(), Some(services)));

		self.host_cache.lock().insert(hostname, host);

		Ok(())
	}

	/// Runs the discovery protocol against the given hostname and returns the
	/// services available at that host.
	///
	/// A host that supports no services at all yields a non-error, empty
	/// [`Host`]; lookups against it fail with "does not provide" errors, the
	/// same messaging as a host that merely lacks the one requested service.
	pub async fn discover(&self, hostname: &Hostname) -> Result<Arc<Host>> {
		let hostname = self.resolve_alias(hostname);
		let cached = self.host_cache.lock().get(&hostname).cloned();

		if let Some(host) = cached {
			self.trace.discovery_host_cached(&hostname);
			record_discovery_outcome(DiscoveryOutcome::Cached);

			return Ok(host);
		}

		let token = self.trace.discovery_start(&hostname);

		record_discovery_outcome(DiscoveryOutcome::Attempt);

		let span = DiscoverySpan::new(&hostname);

		match span.instrument(self.fetch(&hostname)).await {
			Ok(host) => {
				let host = Arc::new(host);

				self.host_cache.lock().insert(hostname.clone(), host.clone());
				self.trace.discovery_success(&token, &hostname);
				record_discovery_outcome(DiscoveryOutcome::Success);

				Ok(host)
			},
			Err(error) => {
				self.trace.discovery_failure(&token, &hostname, &error);
				record_discovery_outcome(DiscoveryOutcome::Failure);

				Err(error)
			},
		}
	}

	/// Convenience wrapper: discovery on the hostname, then a URL lookup for
	/// the given service identifier in the result.
	pub async fn discover_service_url(&self, hostname: &Hostname, service_id: &str) -> Result<Url> {
		self.discover(hostname).await?.service_url(service_id)
	}

	/// Invalidates any cached record of the given hostname; no-op when the
	/// host has no cache entry.
	pub fn forget(&self, hostname: &Hostname) {
		self.host_cache.lock().remove(hostname);
	}

	/// Invalidates every cached host record.
	pub fn forget_all(&self) {
		self.host_cache.lock().clear();
	}

	/// Removes an alias mapping as well as any cache entry keyed by the alias
	/// itself; no-op when neither exists.
	pub fn forget_alias(&self, alias: &Hostname) {
		self.aliases.lock().remove(alias);
		self.forget(alias);
	}

	/// The actual discovery exchange; the caller caches its result.
	///
	/// `hostname` has already been alias-resolved. No map lock is held here.
	async fn fetch(&self, hostname: &Hostname) -> Result<Host> {
		let disco_url = discovery_url(hostname)?;
		let mut request = self
			.http
			.get(disco_url)
			.header(ACCEPT, "application/json")
			.build()
			.map_err(|source| ConfigError::DiscoveryRequest { source })?;
		// A failed credentials lookup downgrades the request to anonymous
		// instead of aborting discovery.
		if let Ok(Some(credentials)) = self.lookup_credentials(hostname).await {
			credentials.prepare_request(&mut request);
		}

		let response = self.http.execute(request).await.map_err(TransportError::from)?;
		// Use the response URL in case the client followed any redirects, so
		// relative service URLs resolve against the document's true location.
		let disco_url = response.url().clone();
		let display = hostname.for_display().to_owned();

		if response.status() == StatusCode::NOT_FOUND {
			// The host provides no services.
			return Ok(Host::new(disco_url, display, None));
		}
		if response.status() != StatusCode::OK {
			return Err(
				ProtocolError::UnexpectedStatus { status: response.status().as_u16() }.into()
			);
		}

		let content_type = response
			.headers()
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.unwrap_or_default()
			.to_owned();
		let media_type = parse_media_type(&content_type)
			.ok_or(ProtocolError::MalformedContentType { content_type })?;

		if media_type != "application/json" {
			return Err(ProtocolError::UnsupportedContentType { media_type }.into());
		}
		// This doesn't catch chunked encoding, which carries no length up
		// front; the capped read below covers that case.
		if response.content_length().is_some_and(|length| length > MAX_DISCO_DOC_BYTES) {
			return Err(ProtocolError::ResponseTooLarge { limit: MAX_DISCO_DOC_BYTES }.into());
		}

		let body = read_capped_body(response).await?;
		let mut deserializer = serde_json::Deserializer::from_slice(&body);
		let services: ServiceMap = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ProtocolError::Decode { source })?;

		Ok(Host::new(disco_url, display, Some(services)))
	}

	/// Credentials for an already-alias-resolved hostname.
	async fn lookup_credentials(
		&self,
		hostname: &Hostname,
	) -> Result<Option<HostCredentialsHandle>> {
		let Some(source) = self.credentials.clone() else {
			return Ok(None);
		};

		Ok(source.for_host(hostname).await?)
	}

	fn resolve_alias(&self, hostname: &Hostname) -> Hostname {
		self.aliases.lock().get(hostname).cloned().unwrap_or_else(|| hostname.clone())
	}
}

/// Builder for [`Disco`] instances.
#[derive(Default)]
pub struct DiscoBuilder {
	http_client: Option<ReqwestClient>,
	credentials: Option<Arc<dyn CredentialsSource>>,
	trace: Option<Arc<dyn DiscoveryTrace>>,
}
impl DiscoBuilder {
	/// Uses the given HTTP client for discovery requests instead of the
	/// default one.
	///
	/// The caller's client governs its own timeout and redirect behavior; the
	/// engine's redirect and timeout bounds apply only to the default client.
	pub fn http_client(mut self, client: ReqwestClient) -> Self {
		self.http_client = Some(client);

		self
	}

	/// Supplies the credentials source consulted for outgoing discovery
	/// requests. Without one, all requests are made anonymously.
	pub fn credentials(mut self, source: Arc<dyn CredentialsSource>) -> Self {
		self.credentials = Some(source);

		self
	}

	/// Attaches a trace observer notified about discovery events.
	pub fn trace(mut self, trace: Arc<dyn DiscoveryTrace>) -> Self {
		self.trace = Some(trace);

		self
	}

	/// Builds the engine, constructing the default HTTP client when none was
	/// supplied.
	pub fn build(self) -> Result<Disco> {
		let http = match self.http_client {
			Some(client) => client,
			None => ReqwestClient::builder()
				.timeout(DISCO_TIMEOUT)
				.redirect(Policy::limited(MAX_REDIRECTS))
				.build()
				.map_err(|source| ConfigError::HttpClientBuild { source })?,
		};

		Ok(Disco {
			aliases: Mutex::new(HashMap::new()),
			host_cache: Mutex::new(HashMap::new()),
			credentials: self.credentials,
			trace: self.trace.unwrap_or_else(|| Arc::new(NoopTrace)),
			http,
		})
	}
}

/// Derives the well-known discovery URL for a hostname.
fn discovery_url(hostname: &Hostname) -> Result<Url, ConfigError> {
	let raw = format!("https://{}{DISCO_PATH}", hostname.as_str());

	Url::parse(&raw)
		.map_err(|source| ConfigError::DiscoveryUrl { host: hostname.as_str().to_owned(), source })
}

/// Extracts the media-type essence from a `Content-Type` header, ignoring any
/// parameters such as `charset`. Returns `None` for values that do not parse
/// as a media type at all.
fn parse_media_type(header: &str) -> Option<String> {
	let essence = header.split_once(';').map_or(header, |(essence, _)| essence).trim();
	let (kind, subtype) = essence.split_once('/')?;
	let token = |part: &str| {
		!part.is_empty()
			&& part
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.' | '_'))
	};

	if !token(kind) || !token(subtype) {
		return None;
	}

	Some(essence.to_ascii_lowercase())
}

/// Streams the response body, failing as soon as it exceeds the document cap
/// so unbounded or chunked bodies cannot exhaust memory.
async fn read_capped_body(mut response: Response) -> Result<Vec<u8>> {
	let mut body = Vec::new();

	while let Some(chunk) =
		response.chunk().await.map_err(|source| TransportError::Body { source })?
	{
		if (body.len() + chunk.len()) as u64 > MAX_DISCO_DOC_BYTES {
			return Err(ProtocolError::ResponseTooLarge { limit: MAX_DISCO_DOC_BYTES }.into());
		}

		body.extend_from_slice(&chunk);
	}

	Ok(body)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn media_type_parsing_ignores_parameters_and_case() {
		assert_eq!(parse_media_type("application/json"), Some("application/json".into()));
		assert_eq!(
			parse_media_type("Application/JSON; charset=utf-8"),
			Some("application/json".into()),
		);
		assert_eq!(
			parse_media_type("application/octet-stream"),
			Some("application/octet-stream".into()),
		);
		assert_eq!(parse_media_type(""), None);
		assert_eq!(parse_media_type("garbage"), None);
		assert_eq!(parse_media_type("appli cation/json"), None);
		assert_eq!(parse_media_type("/json"), None);
	}

	#[test]
	fn discovery_url_lands_on_the_well_known_path() {
		let hostname = Hostname::for_comparison("Example.com:8443")
			.expect("Test hostname should be valid.");

		assert_eq!(
			discovery_url(&hostname).expect("Discovery URL should derive.").as_str(),
			"https://example.com:8443/.well-known/terraform.json",
		);
	}

	#[test]
	fn aliases_resolve_one_hop_only() {
		let disco = Disco::new().expect("Default engine should build.");
		let a = Hostname::for_comparison("a.example.com").expect("Hostname should be valid.");
		let b = Hostname::for_comparison("b.example.com").expect("Hostname should be valid.");
		let c = Hostname::for_comparison("c.example.com").expect("Hostname should be valid.");

		disco.alias(a.clone(), b.clone());
		disco.alias(b.clone(), c.clone());

		assert_eq!(disco.resolve_alias(&a), b);
		assert_eq!(disco.resolve_alias(&b), c);
		assert_eq!(disco.resolve_alias(&c), c);
	}

	#[tokio::test]
	async fn forced_services_bypass_the_network() {
		let disco = crate::_preludet::build_test_disco();
		let hostname =
			Hostname::for_comparison("example.com").expect("Hostname should be valid.");
		let services = serde_json::json!({
			"thingy.v1": "http://example.net/foo",
			"wotsit.v2": "/foo",
		});

		disco
			.force_host_services(
				hostname.clone(),
				services.as_object().cloned().expect("Forced services literal is an object."),
			)
			.expect("Forcing services should succeed.");

		let host = disco.discover(&hostname).await.expect("Forced host should discover.");

		assert_eq!(
			host.service_url("thingy.v1").expect("Absolute forced URL should resolve.").as_str(),
			"http://example.net/foo",
		);
		// Relative URLs resolve exactly as if the map were published at the
		// default discovery location.
		assert_eq!(
			host.service_url("wotsit.v2").expect("Relative forced URL should resolve.").as_str(),
			"https://example.com/foo",
		);
	}

	#[test]
	fn forget_alias_drops_the_mapping_and_the_alias_cache_entry() {
		let disco = crate::_preludet::build_test_disco();
		let alias = Hostname::for_comparison("alias.invalid").expect("Hostname should be valid.");
		let target =
			Hostname::for_comparison("target.invalid").expect("Hostname should be valid.");

		disco.alias(alias.clone(), target.clone());
		// A cache entry keyed by the alias itself, as force_host_services
		// installs it.
		disco
			.force_host_services(alias.clone(), ServiceMap::new())
			.expect("Forcing services should succeed.");
		disco.forget_alias(&alias);

		assert!(disco.aliases.lock().is_empty());
		assert!(disco.host_cache.lock().is_empty());
	}

	#[tokio::test]
	async fn credentials_for_host_without_source_is_none() {
		let disco = Disco::new().expect("Default engine should build.");
		let hostname =
			Hostname::for_comparison("example.com").expect("Hostname should be valid.");

		assert!(
			disco
				.credentials_for_host(&hostname)
				.await
				.expect("Lookup without a source should succeed.")
				.is_none(),
		);
	}
}
