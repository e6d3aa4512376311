//! Bounded exponential backoff around token retrieval attempts.
//!
//! The driver is synchronous and single-threaded: it blocks the calling process for the
//! whole retry window (up to `max_retries × max_wait`), and cancellation is whatever the
//! parent orchestrator does to the process. The sleep function is injected so tests can
//! record the schedule instead of living through it.

// std
use std::{env, thread};
// self
use crate::{
	_prelude::*,
	authorize::{RetrievalOutcome, RetryableReason, TerminalReason},
};

/// Environment variable overriding the retry budget.
pub const ENV_MAX_RETRIES: &str = "OAUTH_MAX_RETRIES";
/// Environment variable overriding the initial wait, in seconds.
pub const ENV_INITIAL_WAIT: &str = "OAUTH_INITIAL_WAIT";
/// Environment variable overriding the wait ceiling, in seconds.
pub const ENV_MAX_WAIT: &str = "OAUTH_MAX_WAIT";

/// Retry budget and backoff shape for the bootstrap flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Number of retryable failures tolerated before giving up.
	pub max_retries: u32,
	/// Wait after the first retryable failure.
	pub initial_wait: Duration,
	/// Ceiling the doubling wait never exceeds.
	pub max_wait: Duration,
}
impl RetryPolicy {
	/// Default retry budget for the general auth module.
	pub const DEFAULT_MAX_RETRIES: u32 = 6;
	/// Retry budget for the bootstrap-only variant, which tolerates a cluster whose
	/// OAuth router is still rolling out.
	pub const BOOTSTRAP_MAX_RETRIES: u32 = 10;

	/// Policy preset used while bootstrapping a freshly provisioned cluster.
	pub fn bootstrap() -> Self {
		Self { max_retries: Self::BOOTSTRAP_MAX_RETRIES, ..Self::default() }
	}

	/// Applies `OAUTH_MAX_RETRIES`/`OAUTH_INITIAL_WAIT`/`OAUTH_MAX_WAIT` overrides.
	///
	/// Unparseable values keep the preset and leave a warning on stderr.
	pub fn with_env_overrides(self) -> Self {
		self.with_overrides(|name| env::var(name).ok())
	}

	fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
		if let Some(value) = parse_override(ENV_MAX_RETRIES, &lookup) {
			self.max_retries = u32::try_from(value).unwrap_or(u32::MAX);
		}
		if let Some(value) = parse_override(ENV_INITIAL_WAIT, &lookup) {
			self.initial_wait = Duration::from_secs(value);
		}
		if let Some(value) = parse_override(ENV_MAX_WAIT, &lookup) {
			self.max_wait = Duration::from_secs(value);
		}

		self
	}

	/// Doubles the wait, capped at [`max_wait`](Self::max_wait).
	pub fn next_wait(&self, current: Duration) -> Duration {
		current.saturating_mul(2).min(self.max_wait)
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_retries: Self::DEFAULT_MAX_RETRIES,
			initial_wait: Duration::from_secs(10),
			max_wait: Duration::from_secs(30),
		}
	}
}

fn parse_override(name: &str, lookup: impl Fn(&str) -> Option<String>) -> Option<u64> {
	let raw = lookup(name)?;

	match raw.trim().parse::<u64>() {
		Ok(value) => Some(value),
		Err(_) => {
			tracing::warn!(name, value = raw, "Ignoring unparseable retry override.");

			None
		},
	}
}

/// Final verdict of a retry-driven bootstrap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetryVerdict {
	/// A bearer token was retrieved.
	Granted(String),
	/// The OAuth server rejected the credentials; retrying cannot help.
	Denied(TerminalReason),
	/// The retry budget ran out; carries the last retryable reason seen.
	Exhausted {
		/// Last retryable failure observed.
		reason: RetryableReason,
		/// Total attempts made.
		attempts: u32,
	},
}

/// Repeats `attempt` under the policy’s backoff schedule.
///
/// Success returns immediately; a terminal failure short-circuits regardless of remaining
/// budget; retryable failures sleep `initial_wait`, doubling up to `max_wait`, until
/// `max_retries` attempts have failed. The attempt closure receives the 1-based attempt
/// number for its own diagnostics.
pub fn drive<A, S>(policy: &RetryPolicy, mut attempt: A, mut sleep: S) -> RetryVerdict
where
	A: FnMut(u32) -> RetrievalOutcome,
	S: FnMut(Duration),
{
	let mut failures = 0;
	let mut wait = policy.initial_wait.min(policy.max_wait);

	loop {
		match attempt(failures + 1) {
			RetrievalOutcome::Success(token) => return RetryVerdict::Granted(token),
			RetrievalOutcome::Terminal(reason) => {
				tracing::info!(reason = %reason, "Terminal failure; not retrying.");

				return RetryVerdict::Denied(reason);
			},
			RetrievalOutcome::Retryable(reason) => {
				failures += 1;

				if failures >= policy.max_retries {
					return RetryVerdict::Exhausted { reason, attempts: failures };
				}

				tracing::info!(
					attempt = failures,
					max_retries = policy.max_retries,
					wait_secs = wait.as_secs(),
					reason = %reason,
					"Attempt failed; backing off before the next try.",
				);
				sleep(wait);

				wait = policy.next_wait(wait);
			},
		}
	}
}

/// [`drive`] with real sleeps, for production use.
pub fn drive_blocking<A>(policy: &RetryPolicy, attempt: A) -> RetryVerdict
where
	A: FnMut(u32) -> RetrievalOutcome,
{
	drive(policy, attempt, thread::sleep)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn secs(value: u64) -> Duration {
		Duration::from_secs(value)
	}

	fn failing_attempt(_: u32) -> RetrievalOutcome {
		RetrievalOutcome::Retryable(RetryableReason::OauthNotReachable)
	}

	#[test]
	fn backoff_schedule_doubles_and_caps() {
		let policy = RetryPolicy::default();
		let mut sleeps = Vec::new();
		let verdict = drive(&policy, failing_attempt, |wait| sleeps.push(wait));

		assert_eq!(sleeps, vec![secs(10), secs(20), secs(30), secs(30), secs(30)]);
		assert_eq!(
			verdict,
			RetryVerdict::Exhausted { reason: RetryableReason::OauthNotReachable, attempts: 6 },
		);
	}

	#[test]
	fn bootstrap_preset_widens_the_budget() {
		let policy = RetryPolicy::bootstrap();
		let mut attempts = 0;
		let verdict = drive(
			&policy,
			|_| {
				attempts += 1;

				RetrievalOutcome::Retryable(RetryableReason::AuthFailed { status: Some(503) })
			},
			|_| {},
		);

		assert_eq!(attempts, 10);
		assert_eq!(
			verdict,
			RetryVerdict::Exhausted {
				reason: RetryableReason::AuthFailed { status: Some(503) },
				attempts: 10,
			},
		);
	}

	#[test]
	fn success_returns_immediately_without_further_sleeps() {
		let policy = RetryPolicy::default();
		let mut sleeps = Vec::new();
		let verdict = drive(
			&policy,
			|attempt| {
				if attempt < 3 {
					RetrievalOutcome::Retryable(RetryableReason::OauthNotReachable)
				} else {
					RetrievalOutcome::Success("sha256~late".into())
				}
			},
			|wait| sleeps.push(wait),
		);

		assert_eq!(verdict, RetryVerdict::Granted("sha256~late".into()));
		assert_eq!(sleeps, vec![secs(10), secs(20)]);
	}

	#[test]
	fn terminal_failures_short_circuit_with_no_sleep() {
		let policy = RetryPolicy::default();
		let mut attempts = 0;
		let verdict = drive(
			&policy,
			|_| {
				attempts += 1;

				RetrievalOutcome::Terminal(TerminalReason::InvalidCredentials)
			},
			|_| panic!("Terminal failures must not sleep."),
		);

		assert_eq!(attempts, 1);
		assert_eq!(verdict, RetryVerdict::Denied(TerminalReason::InvalidCredentials));
	}

	#[test]
	fn env_overrides_replace_the_preset_values() {
		let policy = RetryPolicy::default().with_overrides(|name| match name {
			ENV_MAX_RETRIES => Some("3".into()),
			ENV_INITIAL_WAIT => Some("1".into()),
			ENV_MAX_WAIT => Some("4".into()),
			_ => None,
		});

		assert_eq!(policy.max_retries, 3);
		assert_eq!(policy.initial_wait, secs(1));
		assert_eq!(policy.max_wait, secs(4));
	}

	#[test]
	fn unparseable_overrides_keep_the_preset() {
		let policy = RetryPolicy::default()
			.with_overrides(|name| (name == ENV_MAX_RETRIES).then(|| "six".into()));

		assert_eq!(policy, RetryPolicy::default());
	}

	#[test]
	fn initial_wait_above_the_ceiling_is_clamped() {
		let policy = RetryPolicy {
			max_retries: 3,
			initial_wait: secs(50),
			max_wait: secs(30),
		};
		let mut sleeps = Vec::new();
		let _ = drive(&policy, failing_attempt, |wait| sleeps.push(wait));

		assert_eq!(sleeps, vec![secs(30), secs(30)]);
	}
}
