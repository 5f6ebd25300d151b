//! A small HTTP server that lets users log in with Steam.

use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Context;
use color_eyre::Result;
use steam_login::openid::Verifier;
use steam_login::profile::Resolver;
use steam_login::{http, logging, routes, Config, SteamLogin};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	if let Err(error) = dotenvy::dotenv() {
		eprintln!("WARN: Failed to load `.env` file: {error}");
	}

	let config = Config::parse();

	logging::init().context("failed to initialize logging")?;

	info!(?config, "loaded configuration");

	let http_client =
		http::client(config.http_client_options()).context("failed to build http client")?;

	let verifier = Verifier::new(http_client.clone());
	let resolver = Resolver::new(http_client, config.method, config.steam_api_key.clone());

	resolver
		.check_config()
		.context("invalid profile configuration")?;

	let steam_login = SteamLogin::new(
		config.public_url.clone(),
		config.return_route.clone(),
		verifier,
		resolver,
	);

	let listener = TcpListener::bind(config.addr)
		.await
		.with_context(|| format!("failed to bind to `{}`", config.addr))?;

	info!(addr = %listener.local_addr()?, "listening for requests");

	axum::serve(listener, routes::router(Arc::new(steam_login)))
		.with_graceful_shutdown(sigint())
		.await
		.context("failed to run http server")?;

	info!("shutting down");

	Ok(())
}

/// Resolves once the process receives SIGINT.
async fn sigint() {
	if let Err(error) = signal::ctrl_c().await {
		warn!(%error, "failed to listen for ctrl-c; shutting down");
	}
}
