// self
use crate::obs::DiscoveryOutcome;

/// Records a discovery outcome via the global metrics recorder (when enabled).
pub fn record_discovery_outcome(outcome: DiscoveryOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("svc_disco_discovery_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}
