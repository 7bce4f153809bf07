// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use httpmock::prelude::*;
// self
use svc_disco::{
	disco::Disco,
	error::{Error, LookupError, ProtocolError},
	hostname::Hostname,
	obs::{DiscoveryTrace, TraceToken},
	reqwest,
};

const MANIFEST: &str = r#"{
"thingy.v1": "http://example.com/foo",
"wotsit.v2": "http://example.net/bar"
}"#;

/// Discovery always speaks HTTPS, so tests tolerate the self-signed
/// certificates httpmock serves.
fn test_disco() -> Disco {
	let client = reqwest::Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Insecure test client should build.");

	Disco::builder().http_client(client).build().expect("Test engine should build.")
}

fn localhost(server: &MockServer) -> Hostname {
	Hostname::for_comparison(format!("localhost:{}", server.port()))
		.expect("Mock server hostname should be valid.")
}

#[tokio::test]
async fn discover_resolves_service_urls_end_to_end() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/.well-known/terraform.json")
				.header("accept", "application/json");
			then.status(200).header("content-type", "application/json").body(MANIFEST);
		})
		.await;
	let disco = test_disco();
	let host = disco.discover(&localhost(&server)).await.expect("Discovery should succeed.");

	assert_eq!(
		host.service_url("thingy.v1").expect("Known service should resolve.").as_str(),
		"http://example.com/foo",
	);
	assert_eq!(
		host.service_url("wotsit.v2").expect("Known service should resolve.").as_str(),
		"http://example.net/bar",
	);

	mock.assert_async().await;
}

#[tokio::test]
async fn discover_is_served_from_cache_until_forgotten() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/.well-known/terraform.json");
			then.status(200).header("content-type", "application/json").body(MANIFEST);
		})
		.await;
	let disco = test_disco();
	let hostname = localhost(&server);

	disco.discover(&hostname).await.expect("First discovery should succeed.");
	disco.discover(&hostname).await.expect("Second discovery should come from cache.");

	mock.assert_calls_async(1).await;

	disco.forget(&hostname);
	disco.discover(&hostname).await.expect("Post-forget discovery should succeed.");

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn a_404_means_the_host_provides_no_services() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/.well-known/terraform.json");
			then.status(404).body("not found");
		})
		.await;
	let disco = test_disco();
	let hostname = localhost(&server);
	let host = disco.discover(&hostname).await.expect("A 404 is not a discovery error.");

	assert!(matches!(
		host.service_url("thingy.v1"),
		Err(Error::Lookup(LookupError::ServiceNotProvided { .. })),
	));

	// The empty result is cached like any other success.
	disco.discover(&hostname).await.expect("Cached empty host should be returned.");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn unexpected_statuses_fail_and_are_never_cached() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/.well-known/terraform.json");
			then.status(500);
		})
		.await;
	let disco = test_disco();
	let hostname = localhost(&server);

	for _ in 0..2 {
		let error = disco.discover(&hostname).await.expect_err("A 500 should fail discovery.");

		assert!(matches!(
			error,
			Error::Protocol(ProtocolError::UnexpectedStatus { status: 500 }),
		));
	}

	// Each failing call went to the network; errors never populate the cache.
	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn wrong_content_type_is_rejected_even_with_valid_json() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/.well-known/terraform.json");
			then.status(200).header("content-type", "application/octet-stream").body(MANIFEST);
		})
		.await;

	let error = test_disco()
		.discover(&localhost(&server))
		.await
		.expect_err("Non-JSON content type should fail discovery.");

	assert!(matches!(
		error,
		Error::Protocol(ProtocolError::UnsupportedContentType { media_type }) if media_type == "application/octet-stream",
	));
}

#[tokio::test]
async fn charset_parameters_on_the_content_type_are_ignored() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/.well-known/terraform.json");
			then.status(200)
				.header("content-type", "application/json; charset=utf-8")
				.body(MANIFEST);
		})
		.await;

	test_disco()
		.discover(&localhost(&server))
		.await
		.expect("Parameters after the media type should not fail discovery.");
}

#[tokio::test]
async fn oversized_documents_are_rejected() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/.well-known/terraform.json");
			then.status(200)
				.header("content-type", "application/json")
				.body("x".repeat(1024 * 1024 + 1));
		})
		.await;

	let error = test_disco()
		.discover(&localhost(&server))
		.await
		.expect_err("A document above the cap should fail discovery.");

	assert!(matches!(error, Error::Protocol(ProtocolError::ResponseTooLarge { .. })));
}

#[tokio::test]
async fn non_object_documents_are_rejected() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/.well-known/terraform.json");
			then.status(200).header("content-type", "application/json").body("[1, 2, 3]");
		})
		.await;

	let error = test_disco()
		.discover(&localhost(&server))
		.await
		.expect_err("A non-object document should fail discovery.");

	assert!(matches!(error, Error::Protocol(ProtocolError::Decode { .. })));
}

#[tokio::test]
async fn relative_urls_resolve_against_the_post_redirect_location() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/.well-known/terraform.json");
			then.status(301).header("location", "/disco/foo.json");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/disco/foo.json");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"thingy.v1": "./bar"}"#);
		})
		.await;

	let hostname = localhost(&server);
	let host =
		test_disco().discover(&hostname).await.expect("Redirected discovery should succeed.");

	assert_eq!(host.base_url().path(), "/disco/foo.json");
	assert_eq!(
		host.service_url("thingy.v1").expect("Relative service URL should resolve.").as_str(),
		format!("https://{}/disco/bar", hostname.as_str()),
	);
}

#[tokio::test]
async fn discover_service_url_composes_discovery_and_lookup() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/.well-known/terraform.json");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"thingy.v1": "http://example.com/foo"}"#);
		})
		.await;

	let url = test_disco()
		.discover_service_url(&localhost(&server), "thingy.v1")
		.await
		.expect("Composed discovery should succeed.");

	assert_eq!(url.as_str(), "http://example.com/foo");
}

#[tokio::test]
async fn aliases_redirect_discovery_and_invalidate_cleanly() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/.well-known/terraform.json");
			then.status(200).header("content-type", "application/json").body(MANIFEST);
		})
		.await;
	let disco = test_disco();
	let target = localhost(&server);
	let alias =
		Hostname::for_comparison("alias.invalid").expect("Alias hostname should be valid.");

	disco.alias(alias.clone(), target.clone());

	let via_alias =
		disco.discover(&alias).await.expect("Discovery through the alias should succeed.");
	let direct = disco.discover(&target).await.expect("Direct discovery should hit the cache.");

	assert_eq!(via_alias.base_url(), direct.base_url());

	// Both lookups were served by one network exchange, keyed by the target.
	mock.assert_calls_async(1).await;

	disco.forget_alias(&alias);

	// The alias no longer redirects anywhere, and nothing answers at the
	// literal alias hostname.
	disco
		.discover(&alias)
		.await
		.expect_err("Discovery for a forgotten alias should fail.");

	// The target's cache entry is untouched.
	disco.discover(&target).await.expect("Target should still be cached.");

	mock.assert_calls_async(1).await;
}

/// Observer double counting events and checking token correlation.
#[derive(Default)]
struct RecordingTrace {
	starts: AtomicUsize,
	successes: AtomicUsize,
	failures: AtomicUsize,
	cached: AtomicUsize,
	correlated: AtomicUsize,
}
impl RecordingTrace {
	fn correlate(&self, token: &TraceToken) {
		if token.downcast_ref::<usize>().is_some() {
			self.correlated.fetch_add(1, Ordering::SeqCst);
		}
	}
}
impl DiscoveryTrace for RecordingTrace {
	fn discovery_start(&self, _: &Hostname) -> TraceToken {
		TraceToken::new(self.starts.fetch_add(1, Ordering::SeqCst))
	}

	fn discovery_success(&self, token: &TraceToken, _: &Hostname) {
		self.correlate(token);
		self.successes.fetch_add(1, Ordering::SeqCst);
	}

	fn discovery_failure(&self, token: &TraceToken, _: &Hostname, _: &Error) {
		self.correlate(token);
		self.failures.fetch_add(1, Ordering::SeqCst);
	}

	fn discovery_host_cached(&self, _: &Hostname) {
		self.cached.fetch_add(1, Ordering::SeqCst);
	}
}

#[tokio::test]
async fn trace_events_pair_start_with_completion_and_flag_cache_hits() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/.well-known/terraform.json");
			then.status(200).header("content-type", "application/json").body(MANIFEST);
		})
		.await;

	let trace = Arc::new(RecordingTrace::default());
	let client = reqwest::Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Insecure test client should build.");
	let disco = Disco::builder()
		.http_client(client)
		.trace(trace.clone())
		.build()
		.expect("Test engine should build.");
	let hostname = localhost(&server);

	disco.discover(&hostname).await.expect("Traced discovery should succeed.");
	disco.discover(&hostname).await.expect("Cached discovery should succeed.");

	// The cache hit fires its own event instead of a start/completion pair.
	assert_eq!(trace.starts.load(Ordering::SeqCst), 1);
	assert_eq!(trace.successes.load(Ordering::SeqCst), 1);
	assert_eq!(trace.cached.load(Ordering::SeqCst), 1);
	assert_eq!(trace.failures.load(Ordering::SeqCst), 0);

	let unreachable =
		Hostname::for_comparison("unreachable.invalid").expect("Hostname should be valid.");

	disco.discover(&unreachable).await.expect_err("Discovery of .invalid should fail.");

	assert_eq!(trace.starts.load(Ordering::SeqCst), 2);
	assert_eq!(trace.failures.load(Ordering::SeqCst), 1);
	// Every completion callback received the token minted by its start.
	assert_eq!(trace.correlated.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn forget_all_clears_every_cached_host() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/.well-known/terraform.json");
			then.status(200).header("content-type", "application/json").body(MANIFEST);
		})
		.await;
	let disco = test_disco();
	let hostname = localhost(&server);

	disco.discover(&hostname).await.expect("First discovery should succeed.");
	disco.forget_all();
	disco.discover(&hostname).await.expect("Post-forget-all discovery should succeed.");

	mock.assert_calls_async(2).await;
}
