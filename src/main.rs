//! Subprocess entry point implementing the stdin/stdout JSON contract.
//!
//! stdin carries one JSON request, stdout carries exactly one line of JSON result, stderr
//! carries the human-readable narrative, and the exit code is always 0—failure lives in
//! the `authenticated`/`error` fields so the calling orchestrator can tell “tool crashed”
//! from “credentials invalid.”

// std
use std::{
	env,
	io::{self, Read},
};
// crates.io
use tracing_subscriber::EnvFilter;
// self
use rosa_token_bootstrap::{
	codec::{self, AuthResult},
	flow,
	http::BootstrapHttpClient,
	retry::RetryPolicy,
};

fn main() {
	init_diagnostics();

	let result = run();

	println!("{}", result.encode());
}

fn run() -> AuthResult {
	let mut input = String::new();

	if let Err(err) = io::stdin().read_to_string(&mut input) {
		return AuthResult::denied(format!("failed to read request from stdin: {err}"));
	}

	let request = codec::decode_request(&input);
	let policy = if env::args().any(|arg| arg == "--bootstrap") {
		RetryPolicy::bootstrap()
	} else {
		RetryPolicy::default()
	}
	.with_env_overrides();

	tracing::info!(request = ?request, ?policy, "Starting OAuth token bootstrap.");

	let http = match BootstrapHttpClient::new() {
		Ok(http) => http,
		Err(err) => return AuthResult::denied(format!("failed to build HTTP client: {err}")),
	};

	flow::bootstrap(&http, &request, &policy)
}

fn init_diagnostics() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

	// stdout belongs to the wire contract; diagnostics go to stderr only.
	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(io::stderr)
		.with_target(false)
		.try_init();
}
