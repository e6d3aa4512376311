//! Single token retrieval attempts against the OpenShift challenging-client endpoint.
//!
//! The challenging-client flow is browser-less: the OAuth server answers
//! `GET /oauth/authorize?response_type=token&client_id=openshift-challenging-client` with a
//! 302 whose `Location` header embeds the bearer token as an `access_token` parameter. The
//! client therefore inspects raw headers and must never follow the redirect. Each attempt
//! classifies its raw outcome into [`RetrievalOutcome`], the closed variant set the retry
//! driver is built around.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	http::{self, BootstrapHttpClient, ChallengeResponse},
	obs::{self, AttemptOutcome},
};

/// OAuth client identifier for OpenShift’s browser-less challenge flow.
pub const CHALLENGING_CLIENT_ID: &str = "openshift-challenging-client";

const CSRF_HEADER: HeaderName = HeaderName::from_static("x-csrf-token");

/// Classified result of exactly one retrieval attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetrievalOutcome {
	/// A bearer token was extracted from the redirect.
	Success(String),
	/// Attempt failed but a later one may succeed.
	Retryable(RetryableReason),
	/// Attempt failed in a way retrying cannot fix.
	Terminal(TerminalReason),
}

/// Failure modes worth spending retry budget on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetryableReason {
	/// Neither `/healthz` nor a bare GET reached the OAuth server.
	OauthNotReachable,
	/// The server answered, but not with a token or a terminal status.
	AuthFailed {
		/// HTTP status observed, when the response got that far.
		status: Option<u16>,
	},
}
impl RetryableReason {
	/// Returns the stable label used in logs and wire error messages.
	pub const fn as_str(&self) -> &'static str {
		match self {
			RetryableReason::OauthNotReachable => "oauth_not_reachable",
			RetryableReason::AuthFailed { .. } => "auth_failed",
		}
	}
}
impl Display for RetryableReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			RetryableReason::AuthFailed { status: Some(status) } =>
				write!(f, "auth_failed (HTTP {status})"),
			other => f.write_str(other.as_str()),
		}
	}
}

/// Failure modes that must never be retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalReason {
	/// OAuth server answered HTTP 401.
	InvalidCredentials,
	/// OAuth server answered HTTP 403.
	AccessForbidden,
}
impl TerminalReason {
	/// Returns the user-facing wire message for this rejection.
	pub const fn message(self) -> &'static str {
		match self {
			TerminalReason::InvalidCredentials => "invalid credentials",
			TerminalReason::AccessForbidden => "access forbidden",
		}
	}
}
impl Display for TerminalReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.message())
	}
}

/// Performs exactly one authorization attempt against a resolved OAuth endpoint.
pub fn attempt_token_retrieval(
	http: &BootstrapHttpClient,
	oauth_url: &Url,
	username: &str,
	password: &str,
) -> RetrievalOutcome {
	let outcome = attempt_inner(http, oauth_url, username, password);

	obs::record_attempt_outcome(match &outcome {
		RetrievalOutcome::Success(_) => AttemptOutcome::Success,
		RetrievalOutcome::Retryable(_) => AttemptOutcome::Retryable,
		RetrievalOutcome::Terminal(_) => AttemptOutcome::Terminal,
	});

	outcome
}

fn attempt_inner(
	http: &BootstrapHttpClient,
	oauth_url: &Url,
	username: &str,
	password: &str,
) -> RetrievalOutcome {
	if !http.endpoint_alive(oauth_url) {
		tracing::info!(oauth_url = %oauth_url, "OAuth endpoint did not answer the liveness probe.");

		return RetrievalOutcome::Retryable(RetryableReason::OauthNotReachable);
	}

	let Some(headers) = challenge_headers(username, password) else {
		// Base64 output is always a valid header value; this arm is untakeable in practice.
		return RetrievalOutcome::Retryable(RetryableReason::AuthFailed { status: None });
	};
	let response = match http.get_no_redirect(authorize_url(oauth_url), headers) {
		Ok(response) => response,
		Err(err) => {
			tracing::info!(error = %err, "Challenge request failed at the transport layer.");

			return RetrievalOutcome::Retryable(RetryableReason::OauthNotReachable);
		},
	};

	classify_challenge(&response)
}

/// Maps a raw challenge response onto the outcome taxonomy.
///
/// A token-bearing `Location` wins regardless of status; 401 and 403 are terminal;
/// everything else is retryable with the observed status attached for diagnosis.
pub fn classify_challenge(response: &ChallengeResponse) -> RetrievalOutcome {
	if let Some(token) = response.location.as_deref().and_then(extract_access_token) {
		return RetrievalOutcome::Success(token);
	}

	match response.status {
		401 => RetrievalOutcome::Terminal(TerminalReason::InvalidCredentials),
		403 => RetrievalOutcome::Terminal(TerminalReason::AccessForbidden),
		status => {
			tracing::info!(status, "Challenge response carried no token.");

			RetrievalOutcome::Retryable(RetryableReason::AuthFailed { status: Some(status) })
		},
	}
}

/// Extracts a bearer token from a redirect `Location` value.
///
/// OpenShift places `access_token` in the fragment of the implicit-flow redirect; some
/// proxies rewrite it into the query, and mis-relaying hops can leave the value relative
/// or CR-terminated, so the raw-scan path backs the structured one.
pub fn extract_access_token(location: &str) -> Option<String> {
	let location = location.trim();

	if let Ok(url) = Url::parse(location) {
		if let Some(token) = find_pair(url.query().unwrap_or_default()) {
			return Some(token);
		}

		return find_pair(url.fragment().unwrap_or_default());
	}

	// Relative redirect target; scan for the parameter wherever it sits.
	location
		.match_indices("access_token=")
		.find(|(idx, _)| {
			*idx == 0
				|| matches!(location[..*idx].chars().next_back(), Some('?' | '&' | '#'))
		})
		.and_then(|(idx, _)| {
			let pair = location[idx..].split(['&', '#']).next().unwrap_or_default();

			find_pair(pair)
		})
}

/// Finds and URL-decodes the `access_token` value inside a form-encoded component.
fn find_pair(component: &str) -> Option<String> {
	form_urlencoded::parse(component.as_bytes())
		.find(|(key, _)| key == "access_token")
		.map(|(_, value)| value.trim().to_owned())
		.filter(|token| !token.is_empty())
}

fn authorize_url(oauth_url: &Url) -> Url {
	let mut url = http::join_path(oauth_url, "oauth/authorize");

	url.query_pairs_mut()
		.append_pair("response_type", "token")
		.append_pair("client_id", CHALLENGING_CLIENT_ID);

	url
}

fn challenge_headers(username: &str, password: &str) -> Option<HeaderMap> {
	let encoded = STANDARD.encode(format!("{username}:{password}"));
	let mut authorization = HeaderValue::try_from(format!("Basic {encoded}")).ok()?;
	let mut headers = HeaderMap::new();

	authorization.set_sensitive(true);
	headers.insert(AUTHORIZATION, authorization);
	headers.insert(CSRF_HEADER, HeaderValue::from_static("1"));

	Some(headers)
}
