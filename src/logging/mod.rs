//! Log-capturing facilities.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod stderr;

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "steam_login=info,tower_http=info,warn";

/// Initializes [`tracing-subscriber`].
///
/// `RUST_LOG` controls what gets logged; see [`EnvFilter`] for the syntax.
///
/// [`tracing-subscriber`]: tracing_subscriber
pub fn init() -> color_eyre::Result<()> {
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))?;

	tracing_subscriber::registry()
		.with(stderr::layer(filter))
		.try_init()?;

	tracing::info!("initialized logging");

	Ok(())
}
