#![doc = include_str!("../README.md")]

mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::Config;

pub mod http;
pub mod logging;

pub mod openid;
pub mod identity;
pub mod profile;

mod login;
pub use login::{Login, SteamLogin};

pub mod button;
pub mod routes;

pub use steam_id::SteamId;

#[cfg(test)]
#[ctor::ctor]
fn test_setup() {
	use tracing_subscriber::fmt::format::FmtSpan;
	use tracing_subscriber::EnvFilter;

	color_eyre::install().expect("failed to install color-eyre");
	tracing_subscriber::fmt()
		.compact()
		.with_file(true)
		.with_level(true)
		.with_line_number(true)
		.with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
		.with_target(true)
		.with_test_writer()
		.with_env_filter(EnvFilter::from_default_env())
		.init();
}
