//! Observability hooks for the discovery engine.
//!
//! Two layers, independent of each other:
//!
//! - [`DiscoveryTrace`] is an explicit observer attached to a
//!   [`Disco`](crate::disco::Disco) instance. Its callbacks run synchronously
//!   inline with the discovery call, so they must not perform long-blocking
//!   work. A [`TraceToken`] returned by `discovery_start` is handed back to the
//!   matching success/failure callback, correlating the pair.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to wrap each network discovery in a span named
//!   `svc_disco.discovery` with a `host` field.
//! - Enable `metrics` to increment the `svc_disco_discovery_total` counter for
//!   every attempt/success/failure/cache hit, labeled by `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// std
use std::any::Any;
// self
use crate::{_prelude::*, hostname::Hostname};

/// Observer notified about potentially-interesting events during discovery.
///
/// All methods have no-op defaults, so implementations override only the events
/// they care about.
pub trait DiscoveryTrace
where
	Self: Send + Sync,
{
	/// Called when a network discovery request is about to begin.
	///
	/// The returned token is passed to either [`discovery_success`] or
	/// [`discovery_failure`] once the request completes, so per-request values
	/// such as distributed tracing spans can carry across the exchange.
	///
	/// [`discovery_success`]: DiscoveryTrace::discovery_success
	/// [`discovery_failure`]: DiscoveryTrace::discovery_failure
	fn discovery_start(&self, host: &Hostname) -> TraceToken {
		let _ = host;

		TraceToken::default()
	}

	/// Called after a discovery request completes successfully.
	fn discovery_success(&self, token: &TraceToken, host: &Hostname) {
		let _ = (token, host);
	}

	/// Called after a discovery request completes with an error.
	fn discovery_failure(&self, token: &TraceToken, host: &Hostname, error: &Error) {
		let _ = (token, host, error);
	}

	/// Called instead of the start/completion pair when a discovery request is
	/// served from the cache of previous results.
	fn discovery_host_cached(&self, host: &Hostname) {
		let _ = host;
	}
}

/// Observer that ignores every event; the engine's default.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTrace;
impl DiscoveryTrace for NoopTrace {}

/// Opaque correlation value flowing from [`DiscoveryTrace::discovery_start`] to
/// the matching completion callback.
#[derive(Clone, Default)]
pub struct TraceToken(Option<Arc<dyn Any + Send + Sync>>);
impl TraceToken {
	/// Wraps an observer-defined payload.
	pub fn new<T>(value: T) -> Self
	where
		T: Any + Send + Sync,
	{
		Self(Some(Arc::new(value)))
	}

	/// Borrows the payload back, if one was set and the type matches.
	pub fn downcast_ref<T>(&self) -> Option<&T>
	where
		T: Any + Send + Sync,
	{
		self.0.as_deref()?.downcast_ref()
	}
}
impl Debug for TraceToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TraceToken(..)")
	}
}

/// Discovery outcomes observed by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiscoveryOutcome {
	/// Entry to a network discovery request.
	Attempt,
	/// Successful completion, including the 404 "no services" case.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Request served from the host cache without touching the network.
	Cached,
}
impl DiscoveryOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			DiscoveryOutcome::Attempt => "attempt",
			DiscoveryOutcome::Success => "success",
			DiscoveryOutcome::Failure => "failure",
			DiscoveryOutcome::Cached => "cached",
		}
	}
}
impl Display for DiscoveryOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
