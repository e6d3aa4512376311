//! Synchronous OpenShift OAuth token bootstrap—resolve the cluster’s OAuth endpoint, run the
//! challenging-client flow, and retry with bounded backoff behind an always-valid JSON
//! subprocess contract.
//!
//! The crate is consumed two ways: as a library exposing the codec, resolver, retrieval
//! attempt, and retry driver as typed APIs, and as the `rosa-token-bootstrap` binary that a
//! provisioning orchestrator invokes with a JSON request on stdin. The binary’s contract is
//! deliberate: exactly one line of parseable JSON on stdout and exit code 0, no matter what
//! went wrong, so the orchestrator can always distinguish “tool crashed” from “credentials
//! invalid.”

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod authorize;
pub mod codec;
pub mod error;
pub mod flow;
pub mod http;
pub mod obs;
pub mod resolve;
pub mod retry;

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		time::Duration,
	};

	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use url;
// The fmt subscriber is installed by the binary; the library itself only emits events.
use tracing_subscriber as _;
#[cfg(test)] use httpmock as _;
