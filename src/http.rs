//! The HTTP client used for every request to Steam.

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};

/// Default for [`ClientOptions::timeout`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// `User-Agent` sent along with every request.
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Options for [`client()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
	/// Upper bound for an entire request, including reading the body.
	pub timeout: Duration,

	/// Skip TLS certificate verification.
	///
	/// Only ever enable this when talking to Steam through an intercepting
	/// proxy.
	pub accept_invalid_certs: bool,
}

impl Default for ClientOptions {
	fn default() -> Self {
		Self { timeout: DEFAULT_TIMEOUT, accept_invalid_certs: false }
	}
}

/// Builds the [`reqwest::Client`] shared by the verifier and the profile
/// resolver.
#[tracing::instrument(level = "debug", err(Debug, level = "debug"))]
pub fn client(options: ClientOptions) -> reqwest::Result<reqwest::Client> {
	if options.accept_invalid_certs {
		tracing::warn!("TLS certificate verification is disabled");
	}

	let mut default_headers = HeaderMap::new();
	default_headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en"));

	reqwest::Client::builder()
		.user_agent(USER_AGENT)
		.default_headers(default_headers)
		.timeout(options.timeout)
		.danger_accept_invalid_certs(options.accept_invalid_certs)
		.build()
}
