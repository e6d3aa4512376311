//! Request/response codec for the subprocess contract.
//!
//! Decoding prefers the structured `serde_json` path (wrapped in `serde_path_to_error` so
//! a malformed orchestrator payload names the offending field on stderr) and degrades to a
//! permissive key scanner that pulls `"key": "value"` pairs out of almost-JSON. Encoding
//! always yields exactly one line of valid JSON with three string-valued fields; the
//! `authenticated` flag is rendered as the literal strings `"true"`/`"false"` so the schema
//! stays uniform for consumers on either parsing strategy.

// self
use crate::{_prelude::*, error::InputError};

/// Credential request read from stdin.
///
/// The invariant callers rely on: either both `username` and `password` are present, or the
/// whole request is invalid and fails before any network call.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthRequest {
	/// Cluster API endpoint (absolute URL).
	pub api_url: String,
	/// Optional OAuth endpoint override; used verbatim when present.
	pub oauth_url: Option<String>,
	/// Identity provider username.
	pub username: String,
	/// Identity provider password.
	pub password: String,
}
impl AuthRequest {
	/// Ensures the credential pair is complete.
	pub fn validate_credentials(&self) -> Result<(), InputError> {
		if self.username.trim().is_empty() || self.password.is_empty() {
			return Err(InputError::MissingCredentials);
		}

		Ok(())
	}

	/// Parses `api_url` into an absolute [`Url`] with a host.
	pub fn api_endpoint(&self) -> Result<Url, InputError> {
		let raw = self.api_url.trim();

		if raw.is_empty() {
			return Err(InputError::MissingApiUrl);
		}

		let url = Url::parse(raw).map_err(|source| InputError::InvalidApiUrl { source })?;

		if url.host_str().is_none() {
			return Err(InputError::InvalidApiUrl { source: url::ParseError::EmptyHost });
		}
		if url.scheme() != "https" {
			tracing::warn!(scheme = url.scheme(), "api_url is not HTTPS; proceeding anyway.");
		}

		Ok(url)
	}

	/// Returns the OAuth override with blank values treated as absent.
	pub fn oauth_override(&self) -> Option<&str> {
		self.oauth_url.as_deref().map(str::trim).filter(|value| !value.is_empty())
	}
}
impl Debug for AuthRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthRequest")
			.field("api_url", &self.api_url)
			.field("oauth_url", &self.oauth_url)
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Wire result written to stdout.
///
/// Exactly one of {token non-empty, authenticated, error empty} or {token empty, not
/// authenticated, error non-empty} holds; the constructors enforce it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthResult {
	/// Opaque bearer token; empty on failure.
	pub token: String,
	/// Whether authorization succeeded.
	#[serde(serialize_with = "bool_as_string")]
	pub authenticated: bool,
	/// Failure description; empty on success.
	pub error: String,
}
impl AuthResult {
	/// Builds the success shape carrying a bearer token.
	pub fn granted(token: impl Into<String>) -> Self {
		Self { token: token.into(), authenticated: true, error: String::new() }
	}

	/// Builds the failure shape carrying a description of what went wrong.
	pub fn denied(error: impl Into<String>) -> Self {
		Self { token: String::new(), authenticated: false, error: error.into() }
	}

	/// Encodes the result as a single line of JSON.
	///
	/// This never fails: if serde ever refused the value, a hand-assembled escape path
	/// keeps the “always produce parseable output” contract intact.
	pub fn encode(&self) -> String {
		serde_json::to_string(self).unwrap_or_else(|_| {
			format!(
				"{{\"token\":\"{}\",\"authenticated\":\"{}\",\"error\":\"{}\"}}",
				escape_json(&self.token),
				self.authenticated,
				escape_json(&self.error),
			)
		})
	}
}

fn bool_as_string<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
	S: serde::Serializer,
{
	serializer.serialize_str(if *value { "true" } else { "false" })
}

/// Decodes a request from raw stdin bytes.
///
/// Never raises: a payload the structured parser rejects is handed to the permissive
/// scanner, and whatever fields neither path recovers are left empty for the validation
/// stage to report.
pub fn decode_request(input: &str) -> AuthRequest {
	let mut deserializer = serde_json::Deserializer::from_str(input);

	match serde_path_to_error::deserialize::<_, AuthRequest>(&mut deserializer) {
		Ok(request) => request,
		Err(err) => {
			tracing::warn!(error = %err, "Structured decode failed; falling back to key scanning.");

			scan_request(input)
		},
	}
}

fn scan_request(input: &str) -> AuthRequest {
	let mut request = AuthRequest::default();

	for (key, value) in scan_string_fields(input) {
		match key.as_str() {
			"api_url" => request.api_url = value,
			"oauth_url" =>
				if !value.trim().is_empty() {
					request.oauth_url = Some(value);
				},
			"username" => request.username = value,
			"password" => request.password = value,
			_ => {},
		}
	}

	request
}

/// Pulls `"key": "value"` pairs out of loosely JSON-shaped text.
fn scan_string_fields(input: &str) -> Vec<(String, String)> {
	let mut fields = Vec::new();
	let mut chars = input.chars().peekable();

	while let Some(ch) = chars.next() {
		if ch != '"' {
			continue;
		}

		let Some(key) = read_quoted(&mut chars) else {
			break;
		};

		while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
			chars.next();
		}
		if chars.peek() != Some(&':') {
			continue;
		}

		chars.next();

		while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
			chars.next();
		}
		if chars.peek() != Some(&'"') {
			continue;
		}

		chars.next();

		let Some(value) = read_quoted(&mut chars) else {
			break;
		};

		fields.push((key, value));
	}

	fields
}

/// Reads a quoted string whose opening quote has already been consumed.
fn read_quoted(chars: &mut std::iter::Peekable<std::str::Chars>) -> Option<String> {
	let mut buf = String::new();

	loop {
		match chars.next()? {
			'"' => return Some(buf),
			'\\' => match chars.next()? {
				'n' => buf.push('\n'),
				'r' => buf.push('\r'),
				't' => buf.push('\t'),
				other => buf.push(other),
			},
			other => buf.push(other),
		}
	}
}

fn escape_json(value: &str) -> String {
	let mut buf = String::with_capacity(value.len());

	for ch in value.chars() {
		match ch {
			'"' => buf.push_str("\\\""),
			'\\' => buf.push_str("\\\\"),
			'\n' => buf.push_str("\\n"),
			'\r' => buf.push_str("\\r"),
			'\t' => buf.push_str("\\t"),
			c if (c as u32) < 0x20 => buf.push_str(&format!("\\u{:04x}", c as u32)),
			c => buf.push(c),
		}
	}

	buf
}
