// self
use crate::{_prelude::*, hostname::Hostname};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedDiscovery<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedDiscovery<F> = F;

/// A span builder wrapping one network discovery exchange.
#[derive(Clone, Debug)]
pub struct DiscoverySpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl DiscoverySpan {
	/// Creates a new span tagged with the hostname being discovered.
	pub fn new(host: &Hostname) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("svc_disco.discovery", host = host.as_str());

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = host;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedDiscovery<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}
