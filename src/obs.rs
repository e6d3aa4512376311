//! Optional observability helpers for the bootstrap flow.
//!
//! The stderr narrative itself comes from `tracing` events emitted at the call sites; this
//! module only owns the metric labels. Enable the `metrics` feature to increment the
//! `rosa_token_bootstrap_attempt_total` counter per attempt (labeled by `outcome`) and the
//! `rosa_token_bootstrap_resolution_total` counter per resolver run (labeled by `source`).

// self
use crate::_prelude::*;

/// Outcome labels recorded for each token retrieval attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttemptOutcome {
	/// A bearer token was extracted.
	Success,
	/// Attempt failed retryably.
	Retryable,
	/// Attempt failed terminally.
	Terminal,
}
impl AttemptOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AttemptOutcome::Success => "success",
			AttemptOutcome::Retryable => "retryable",
			AttemptOutcome::Terminal => "terminal",
		}
	}
}
impl Display for AttemptOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records an attempt outcome via the global metrics recorder (when enabled).
pub fn record_attempt_outcome(outcome: AttemptOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"rosa_token_bootstrap_attempt_total",
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

/// Records how the OAuth endpoint was resolved (when enabled).
pub fn record_resolution(source: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("rosa_token_bootstrap_resolution_total", "source" => source)
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = source;
	}
}
