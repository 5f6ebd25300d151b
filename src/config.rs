//! This module contains the [`Config`] struct - a set of configuration options
//! that will be read from the command line or the environment on startup.
//!
//! See the `.env.example` file in the root of the repository for all the
//! relevant variables and example values.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use url::Url;

use crate::http::ClientOptions;
use crate::profile::DataSource;

/// Default for [`Config::return_route`].
pub const DEFAULT_RETURN_ROUTE: &str = "/auth/steam/callback";

/// The runtime configuration.
#[derive(Clone, clap::Parser)]
#[command(version, about)]
pub struct Config {
	/// The public URL of the application.
	///
	/// Its origin is sent to Steam as the OpenID realm.
	#[arg(long, env = "STEAM_LOGIN_PUBLIC_URL")]
	pub public_url: Url,

	/// The path Steam redirects users back to after login.
	#[arg(
		long,
		env = "STEAM_LOGIN_RETURN_ROUTE",
		default_value = DEFAULT_RETURN_ROUTE,
		value_parser = parse_route,
	)]
	pub return_route: String,

	/// Where to fetch profile information from.
	#[arg(long, env = "STEAM_LOGIN_METHOD", value_enum, default_value_t = DataSource::Xml)]
	pub method: DataSource,

	/// Steam Web API key, required if `method` is `api`.
	#[arg(long, env = "STEAM_API_KEY")]
	pub steam_api_key: Option<String>,

	/// Timeout for requests to Steam, in seconds.
	#[arg(long, env = "STEAM_LOGIN_HTTP_TIMEOUT", default_value_t = 10)]
	pub http_timeout: u64,

	/// Skip TLS certificate verification for requests to Steam.
	#[arg(long, env = "STEAM_LOGIN_ACCEPT_INVALID_CERTS")]
	pub accept_invalid_certs: bool,

	/// The address the HTTP server should listen on.
	#[arg(
		long,
		env = "STEAM_LOGIN_ADDR",
		default_value_t = SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
	)]
	pub addr: SocketAddr,
}

impl Config {
	/// Options for the HTTP client used to talk to Steam.
	pub const fn http_client_options(&self) -> ClientOptions {
		ClientOptions {
			timeout: Duration::from_secs(self.http_timeout),
			accept_invalid_certs: self.accept_invalid_certs,
		}
	}
}

impl fmt::Debug for Config {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Config")
			.field("public_url", &format_args!("{:?}", self.public_url.as_str()))
			.field("return_route", &self.return_route)
			.field("method", &self.method)
			.field("steam_api_key", &self.steam_api_key.as_ref().map(|_| "*****"))
			.field("http_timeout", &self.http_timeout)
			.field("accept_invalid_certs", &self.accept_invalid_certs)
			.field("addr", &self.addr)
			.finish()
	}
}

/// Routes have to be absolute paths.
fn parse_route(value: &str) -> Result<String, String> {
	if value.starts_with('/') {
		Ok(value.to_owned())
	} else {
		Err(format!("`{value}` does not start with `/`"))
	}
}
