//! Crate-level error types shared across the codec, resolver, and transport layers.
//!
//! Input errors carry the exact lowercase messages the wire contract promises the
//! orchestrator; everything else follows the usual source-chain conventions.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical bootstrap error exposed by library APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Request payload is missing or malformed.
	#[error(transparent)]
	Input(#[from] InputError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Failures raised while validating the orchestrator’s request payload.
///
/// The display strings double as the `error` field of the wire result, so they stay
/// lowercase and free of trailing punctuation.
#[derive(Debug, ThisError)]
pub enum InputError {
	/// Credential pair is incomplete.
	#[error("username and password are required")]
	MissingCredentials,
	/// `api_url` field is absent or blank.
	#[error("api_url is required")]
	MissingApiUrl,
	/// `api_url` does not parse as an absolute URL with a host.
	#[error("api_url is not a valid absolute URL")]
	InvalidApiUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Caller-supplied `oauth_url` override does not parse as an absolute URL.
	#[error("oauth_url is not a valid absolute URL")]
	InvalidOauthOverride {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}

/// Configuration failures raised before any request leaves the process.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport’s builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<reqwest::Error> for ConfigError {
	fn from(e: reqwest::Error) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the OAuth endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<reqwest::Error> for TransportError {
	fn from(e: reqwest::Error) -> Self {
		Self::network(e)
	}
}
