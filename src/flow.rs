//! End-to-end bootstrap flow folding every failure into the wire result.
//!
//! The orchestrator that invokes this tool distinguishes “tool crashed” from “credentials
//! invalid” purely by whether stdout carried parseable JSON, so nothing here may escape as
//! a panic or an error: input problems, transport problems, and auth rejections all fold
//! into an [`AuthResult`].

// self
use crate::{
	_prelude::*,
	authorize,
	codec::{AuthRequest, AuthResult},
	error::InputError,
	http::BootstrapHttpClient,
	resolve,
	retry::{self, RetryPolicy, RetryVerdict},
};

/// Runs the full bootstrap: validate, resolve, then retry the challenge flow.
///
/// Credential validation happens before anything touches the network, so a request with a
/// missing username or password costs zero HTTP calls.
pub fn bootstrap(
	http: &BootstrapHttpClient,
	request: &AuthRequest,
	policy: &RetryPolicy,
) -> AuthResult {
	bootstrap_with_sleep(http, request, policy, std::thread::sleep)
}

/// [`bootstrap`] with an injected sleep function, for schedule-observing tests.
pub fn bootstrap_with_sleep(
	http: &BootstrapHttpClient,
	request: &AuthRequest,
	policy: &RetryPolicy,
	sleep: impl FnMut(Duration),
) -> AuthResult {
	if let Err(err) = request.validate_credentials() {
		return AuthResult::denied(err.to_string());
	}

	let api_url = match request.api_endpoint() {
		Ok(url) => url,
		Err(err) => return AuthResult::denied(err.to_string()),
	};

	if let Some(override_url) = request.oauth_override()
		&& let Err(source) = Url::parse(override_url)
	{
		return AuthResult::denied(InputError::InvalidOauthOverride { source }.to_string());
	}

	let resolved = resolve::resolve_oauth_endpoint(http, &api_url, request.oauth_override());
	let oauth_url = match Url::parse(&resolved.url) {
		Ok(url) => url,
		Err(source) =>
			return AuthResult::denied(InputError::InvalidOauthOverride { source }.to_string()),
	};
	let verdict = retry::drive(
		policy,
		|attempt| {
			tracing::debug!(attempt, oauth_url = %oauth_url, "Requesting token.");

			authorize::attempt_token_retrieval(
				http,
				&oauth_url,
				&request.username,
				&request.password,
			)
		},
		sleep,
	);

	match verdict {
		RetryVerdict::Granted(token) => AuthResult::granted(token),
		RetryVerdict::Denied(reason) => AuthResult::denied(reason.message()),
		RetryVerdict::Exhausted { reason, attempts } => AuthResult::denied(format!(
			"{reason} after {attempts} attempts; re-run the provisioning job once the cluster OAuth endpoint is reachable",
		)),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn http() -> BootstrapHttpClient {
		BootstrapHttpClient::new().expect("Failed to build blocking HTTP stack for tests.")
	}

	#[test]
	fn missing_credentials_fail_before_any_network_call() {
		let request = AuthRequest {
			// Unroutable on purpose; validation must reject the request first.
			api_url: "https://api.cluster.invalid".into(),
			oauth_url: None,
			username: String::new(),
			password: String::new(),
		};
		let result = bootstrap(&http(), &request, &RetryPolicy::default());

		assert_eq!(result, AuthResult::denied("username and password are required"));
	}

	#[test]
	fn invalid_api_url_is_reported_verbatim() {
		let request = AuthRequest {
			api_url: "not a url".into(),
			oauth_url: None,
			username: "admin".into(),
			password: "hunter2".into(),
		};
		let result = bootstrap(&http(), &request, &RetryPolicy::default());

		assert_eq!(result, AuthResult::denied("api_url is not a valid absolute URL"));
	}

	#[test]
	fn invalid_override_is_reported_before_resolution() {
		let request = AuthRequest {
			api_url: "https://api.cluster.invalid".into(),
			oauth_url: Some("::not-a-url::".into()),
			username: "admin".into(),
			password: "hunter2".into(),
		};
		let result = bootstrap(&http(), &request, &RetryPolicy::default());

		assert_eq!(result, AuthResult::denied("oauth_url is not a valid absolute URL"));
	}
}
