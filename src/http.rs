//! Blocking transport primitives for the bootstrap flow.
//!
//! One wrapper, three purpose-built clients: a redirect-following *discovery* client for the
//! `.well-known` document, a *challenge* client that never follows redirects (the bearer
//! token lives in the `Location` header of a 302, and following it would lose the token),
//! and a short-timeout *probe* client for liveness checks. [`ChallengeResponse`] is the only
//! transport type the classification layer sees, so that layer stays decoupled from reqwest.

// crates.io
use reqwest::{
	blocking::{Client, ClientBuilder, Response},
	header::{HeaderMap, LOCATION},
	redirect::Policy,
};
// self
use crate::{_prelude::*, error::TransportError};

/// Blocking HTTP stack shared by the resolver and the retrieval attempt.
pub struct BootstrapHttpClient {
	discovery: Client,
	challenge: Client,
	probe: Client,
}
impl BootstrapHttpClient {
	/// Timeout applied to discovery and challenge requests.
	pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(15);
	/// Timeout applied to liveness probes.
	pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

	/// Builds the stack with default TLS settings.
	pub fn new() -> Result<Self> {
		Self::with_builder(|builder| builder)
	}

	/// Builds the stack after applying a caller customization to every client.
	///
	/// The closure runs once per underlying client because [`ClientBuilder`] is not
	/// cloneable; per-client redirect and timeout settings are applied afterwards and
	/// always win.
	pub fn with_builder<F>(customize: F) -> Result<Self>
	where
		F: Fn(ClientBuilder) -> ClientBuilder,
	{
		let discovery = customize(Client::builder())
			.timeout(Self::DISCOVERY_TIMEOUT)
			.build()
			.map_err(crate::error::ConfigError::from)?;
		let challenge = customize(Client::builder())
			.timeout(Self::DISCOVERY_TIMEOUT)
			.redirect(Policy::none())
			.build()
			.map_err(crate::error::ConfigError::from)?;
		let probe = customize(Client::builder())
			.timeout(Self::PROBE_TIMEOUT)
			.redirect(Policy::none())
			.build()
			.map_err(crate::error::ConfigError::from)?;

		Ok(Self { discovery, challenge, probe })
	}

	/// Fetches a URL with redirects followed, returning the status and body text.
	pub fn get_text(&self, url: Url) -> Result<(u16, String), TransportError> {
		let response = self.discovery.get(url).send().map_err(TransportError::from)?;
		let status = response.status().as_u16();
		let body = response.text().map_err(TransportError::from)?;

		Ok((status, body))
	}

	/// Issues a GET without following redirects, capturing the raw `Location` header.
	pub fn get_no_redirect(
		&self,
		url: Url,
		headers: HeaderMap,
	) -> Result<ChallengeResponse, TransportError> {
		let response =
			self.challenge.get(url).headers(headers).send().map_err(TransportError::from)?;

		Ok(ChallengeResponse::from_response(&response))
	}

	/// Returns whether any HTTP response at all comes back from `url`.
	///
	/// A 404 still counts as reachable; only transport failures (DNS, refused
	/// connections, timeouts) count against liveness.
	pub fn probe(&self, url: Url) -> bool {
		self.probe.get(url).send().is_ok()
	}

	/// Liveness check for an OAuth endpoint: `/healthz` first, bare GET second.
	pub fn endpoint_alive(&self, base: &Url) -> bool {
		self.probe(join_path(base, "healthz")) || self.probe(base.clone())
	}
}
impl Debug for BootstrapHttpClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("BootstrapHttpClient(..)")
	}
}

/// Raw challenge outcome handed to the classification layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChallengeResponse {
	/// HTTP status code of the un-followed response.
	pub status: u16,
	/// Raw `Location` header, when present.
	pub location: Option<String>,
}
impl ChallengeResponse {
	fn from_response(response: &Response) -> Self {
		let location = response
			.headers()
			.get(LOCATION)
			.map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

		Self { status: response.status().as_u16(), location }
	}
}

/// Appends a path segment to a base URL without disturbing an existing path.
pub(crate) fn join_path(base: &Url, segment: &str) -> Url {
	let mut url = base.clone();
	let path = format!("{}/{}", url.path().trim_end_matches('/'), segment);

	url.set_path(&path);
	url.set_query(None);
	url.set_fragment(None);

	url
}
