//! OAuth endpoint resolution for OpenShift clusters.
//!
//! Resolution order: a caller-supplied override wins verbatim; otherwise the cluster’s
//! `.well-known/oauth-authorization-server` document is consulted for its `issuer`; failing
//! that, two candidate URLs are derived from the API domain—the classic router pattern
//! (`oauth-openshift.apps.<domain>`) and the hosted-control-plane pattern
//! (`oauth.<domain>`)—and probed for liveness. The resolver never errors: when nothing is
//! reachable it falls back to the classic pattern and lets the retrieval stage report
//! reachability, which keeps the retry budget in one place.

// self
use crate::{_prelude::*, http::BootstrapHttpClient, obs};

/// Well-known discovery path served by the OpenShift API server.
pub const WELL_KNOWN_PATH: &str = ".well-known/oauth-authorization-server";

/// How an OAuth endpoint URL was chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolutionSource {
	/// Caller-supplied override, used verbatim.
	Override,
	/// `issuer` field of the well-known discovery document.
	Discovery,
	/// Derived candidate that answered a liveness probe.
	Probe,
	/// Classic-pattern fallback chosen when nothing was reachable.
	Default,
}
impl ResolutionSource {
	/// Returns a stable label suitable for log or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ResolutionSource::Override => "override",
			ResolutionSource::Discovery => "discovery",
			ResolutionSource::Probe => "probe",
			ResolutionSource::Default => "default",
		}
	}
}
impl Display for ResolutionSource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Resolver output: always a URL, plus where it came from for the stderr narrative.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedEndpoint {
	/// OAuth authorization server base URL.
	pub url: String,
	/// Provenance of the URL.
	pub source: ResolutionSource,
}
impl ResolvedEndpoint {
	fn new(url: impl Into<String>, source: ResolutionSource) -> Self {
		let resolved = Self { url: url.into(), source };

		obs::record_resolution(source.as_str());
		tracing::info!(url = %resolved.url, source = %source, "Resolved OAuth endpoint.");

		resolved
	}
}

#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
	#[serde(default)]
	issuer: String,
}

/// Produces the OAuth authorization server URL for a cluster API endpoint.
///
/// Never fails; reachability problems surface later, from the retrieval attempts.
pub fn resolve_oauth_endpoint(
	http: &BootstrapHttpClient,
	api_url: &Url,
	override_url: Option<&str>,
) -> ResolvedEndpoint {
	if let Some(override_url) = override_url {
		return ResolvedEndpoint::new(override_url.trim(), ResolutionSource::Override);
	}
	if let Some(issuer) = discover_issuer(http, api_url) {
		return ResolvedEndpoint::new(issuer, ResolutionSource::Discovery);
	}

	let Some((classic, hosted)) = fallback_candidates(api_url) else {
		// Unreachable once the request validation stage has required a host, but the
		// resolver contract is total.
		tracing::warn!(api_url = %api_url, "API URL has no host; using it as the OAuth endpoint.");

		return ResolvedEndpoint::new(api_url.as_str(), ResolutionSource::Default);
	};

	for candidate in [&classic, &hosted] {
		if candidate_alive(http, candidate) {
			return ResolvedEndpoint::new(candidate.clone(), ResolutionSource::Probe);
		}
	}

	// Neither candidate answered; the classic pattern is the historical default.
	ResolvedEndpoint::new(classic, ResolutionSource::Default)
}

fn discover_issuer(http: &BootstrapHttpClient, api_url: &Url) -> Option<String> {
	let well_known =
		format!("{}/{}", api_url.as_str().trim_end_matches('/'), WELL_KNOWN_PATH);
	let url = match Url::parse(&well_known) {
		Ok(url) => url,
		Err(err) => {
			tracing::warn!(url = %well_known, error = %err, "Skipping discovery; URL invalid.");

			return None;
		},
	};

	tracing::debug!(url = %url, "Fetching OAuth discovery document.");

	let (status, body) = match http.get_text(url) {
		Ok(reply) => reply,
		Err(err) => {
			tracing::info!(error = %err, "OAuth discovery request failed.");

			return None;
		},
	};

	if !(200..300).contains(&status) {
		tracing::info!(status, "OAuth discovery returned a non-success status.");

		return None;
	}

	match serde_json::from_str::<DiscoveryDocument>(&body) {
		Ok(document) => {
			let issuer = document.issuer.trim();

			if issuer.is_empty() { None } else { Some(issuer.to_owned()) }
		},
		Err(err) => {
			tracing::info!(error = %err, "OAuth discovery document is not valid JSON.");

			None
		},
	}
}

/// Derives the classic and hosted-control-plane OAuth URL candidates from the API host.
///
/// The cluster domain is the API host minus a leading `api.` label; ports never carry over
/// because both OAuth routers serve standard HTTPS.
fn fallback_candidates(api_url: &Url) -> Option<(String, String)> {
	let host = api_url.host_str()?;
	let domain = host.strip_prefix("api.").unwrap_or(host);

	Some((format!("https://oauth-openshift.apps.{domain}"), format!("https://oauth.{domain}")))
}

fn candidate_alive(http: &BootstrapHttpClient, candidate: &str) -> bool {
	let Ok(url) = Url::parse(candidate) else {
		return false;
	};
	let alive = http.endpoint_alive(&url);

	tracing::debug!(candidate, alive, "Probed OAuth candidate.");

	alive
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse test URL.")
	}

	#[test]
	fn candidates_strip_the_api_label_and_the_port() {
		let (classic, hosted) = fallback_candidates(&url("https://api.prod.example.com:6443"))
			.expect("Candidates should derive from a host-bearing URL.");

		assert_eq!(classic, "https://oauth-openshift.apps.prod.example.com");
		assert_eq!(hosted, "https://oauth.prod.example.com");
	}

	#[test]
	fn candidates_keep_hosts_without_the_api_label() {
		let (classic, hosted) = fallback_candidates(&url("https://cluster.example.com"))
			.expect("Candidates should derive from a host-bearing URL.");

		assert_eq!(classic, "https://oauth-openshift.apps.cluster.example.com");
		assert_eq!(hosted, "https://oauth.cluster.example.com");
	}

	#[test]
	fn discovery_document_tolerates_extra_fields() {
		let document: DiscoveryDocument = serde_json::from_str(
			r#"{"issuer":"https://oauth.example.com","authorization_endpoint":"https://oauth.example.com/oauth/authorize"}"#,
		)
		.expect("Discovery document should deserialize.");

		assert_eq!(document.issuer, "https://oauth.example.com");
	}
}
