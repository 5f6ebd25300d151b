//! The errors that can occur during a login.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::profile;

/// Type alias with a default `Err` type of [`Error`].
///
/// [`Error`]: enum@Error
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The errors that can occur during a login.
#[derive(Debug, Error)]
pub enum Error {
	/// Steam did not confirm the assertion, or it did not contain a usable
	/// SteamID.
	#[error("Steam authentication failed or timed out")]
	AuthenticationFailed,

	/// The deployment is misconfigured.
	#[error("misconfigured: {0}")]
	Configuration(#[source] profile::Error),

	/// The login URL could not be built from the configured realm and route.
	#[error("invalid login URL: {0}")]
	InvalidLoginUrl(#[from] url::ParseError),

	/// Profile information could not be fetched from Steam.
	#[error("failed to fetch profile: {0}")]
	UpstreamFetch(#[source] profile::Error),
}

impl From<profile::Error> for Error {
	fn from(error: profile::Error) -> Self {
		if error.is_configuration_error() {
			Self::Configuration(error)
		} else {
			Self::UpstreamFetch(error)
		}
	}
}

impl Error {
	/// The HTTP status code this error is reported with.
	pub const fn status(&self) -> StatusCode {
		match self {
			Self::AuthenticationFailed => StatusCode::UNAUTHORIZED,
			Self::Configuration(_) | Self::InvalidLoginUrl(_) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::UpstreamFetch(_) => StatusCode::BAD_GATEWAY,
		}
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let status = self.status();

		if status.is_server_error() {
			tracing::error!(error = ?self, "login failed");
		} else {
			tracing::debug!(error = ?self, "login rejected");
		}

		let body = serde_json::json!({ "message": self.to_string() });

		(status, Json(body)).into_response()
	}
}
