// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use httpmock::prelude::*;
// self
use rosa_token_bootstrap::{
	codec::{AuthRequest, AuthResult},
	flow,
	http::BootstrapHttpClient,
	retry::RetryPolicy,
};

const USERNAME: &str = "cluster-admin";
const PASSWORD: &str = "hunter2";

fn http() -> BootstrapHttpClient {
	BootstrapHttpClient::new().expect("Blocking HTTP stack should build for tests.")
}

fn fast_policy(max_retries: u32) -> RetryPolicy {
	RetryPolicy {
		max_retries,
		initial_wait: std::time::Duration::ZERO,
		max_wait: std::time::Duration::ZERO,
	}
}

fn request_with_override(server: &MockServer) -> AuthRequest {
	AuthRequest {
		api_url: format!("{}/unused-api", server.base_url()),
		oauth_url: Some(server.base_url()),
		username: USERNAME.into(),
		password: PASSWORD.into(),
	}
}

fn basic_header() -> String {
	format!("Basic {}", STANDARD.encode(format!("{USERNAME}:{PASSWORD}")))
}

#[test]
fn successful_challenge_extracts_the_redirected_token() {
	let server = MockServer::start();
	let mock = server.mock(|when, then| {
		when.method(GET)
			.path("/oauth/authorize")
			.query_param("response_type", "token")
			.query_param("client_id", "openshift-challenging-client")
			.header("authorization", basic_header())
			.header("x-csrf-token", "1");
		then.status(302).header(
			"location",
			format!(
				"{}/oauth/token/implicit#access_token=sha256~integration&expires_in=86400",
				server.base_url(),
			),
		);
	});
	let result = flow::bootstrap(&http(), &request_with_override(&server), &fast_policy(3));

	assert_eq!(result, AuthResult::granted("sha256~integration"));

	mock.assert_calls(1);
}

#[test]
fn unauthorized_fails_terminally_after_a_single_attempt() {
	let server = MockServer::start();
	let mock = server.mock(|when, then| {
		when.method(GET).path("/oauth/authorize");
		then.status(401);
	});
	let result = flow::bootstrap(&http(), &request_with_override(&server), &fast_policy(5));

	assert_eq!(result, AuthResult::denied("invalid credentials"));

	mock.assert_calls(1);
}

#[test]
fn forbidden_fails_terminally_after_a_single_attempt() {
	let server = MockServer::start();
	let mock = server.mock(|when, then| {
		when.method(GET).path("/oauth/authorize");
		then.status(403);
	});
	let result = flow::bootstrap(&http(), &request_with_override(&server), &fast_policy(5));

	assert_eq!(result, AuthResult::denied("access forbidden"));

	mock.assert_calls(1);
}

#[test]
fn persistent_server_errors_exhaust_the_budget_with_an_attempt_count() {
	let server = MockServer::start();
	let mock = server.mock(|when, then| {
		when.method(GET).path("/oauth/authorize");
		then.status(500);
	});
	let result = flow::bootstrap(&http(), &request_with_override(&server), &fast_policy(3));

	assert!(!result.authenticated);
	assert!(result.token.is_empty());
	assert_eq!(
		result.error,
		"auth_failed (HTTP 500) after 3 attempts; re-run the provisioning job once the cluster OAuth endpoint is reachable",
	);

	mock.assert_calls(3);
}

#[test]
fn redirects_without_a_token_stay_retryable() {
	let server = MockServer::start();
	let mock = server.mock(|when, then| {
		when.method(GET).path("/oauth/authorize");
		then.status(302).header("location", format!("{}/login", server.base_url()));
	});
	let result = flow::bootstrap(&http(), &request_with_override(&server), &fast_policy(2));

	assert!(!result.authenticated);
	assert!(result.error.starts_with("auth_failed (HTTP 302) after 2 attempts"));

	mock.assert_calls(2);
}
