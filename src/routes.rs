//! HTTP routes for logging in with Steam.

use std::sync::Arc;

use axum::extract::{Path, Query, RawQuery, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::button::{button_url, ButtonSize};
use crate::openid::CallbackParameters;
use crate::profile::ProfileRecord;
use crate::{Result, SteamId, SteamLogin};

/// Builds the router.
///
/// - `GET /login` redirects to Steam
/// - `GET <return route>` handles the callback
/// - `GET /login/button` redirects to a button image
/// - `GET /profiles/:steam_id` returns a user's profile
pub fn router(steam_login: Arc<SteamLogin>) -> Router {
	let return_route = steam_login.return_route().to_owned();

	Router::new()
		.route("/login", get(login))
		.route("/login/button", get(button))
		.route(&return_route, get(callback))
		.route("/profiles/:steam_id", get(profile))
		.layer(TraceLayer::new_for_http())
		.with_state(steam_login)
}

/// Query parameters for `GET /login`.
#[derive(Debug, Deserialize)]
struct LoginQuery {
	/// Where to send the user after they logged in.
	#[serde(rename = "return")]
	return_target: Option<String>,
}

/// Redirects the user to Steam.
#[tracing::instrument(level = "debug", skip_all, err(Debug, level = "debug"))]
async fn login(
	State(steam_login): State<Arc<SteamLogin>>,
	Query(query): Query<LoginQuery>,
) -> Result<Redirect> {
	let realm = steam_login.realm();
	let return_target = query
		.return_target
		.and_then(|target| realm.join(&target).ok())
		.unwrap_or_else(|| realm.clone());

	let url = steam_login.login_url(&return_target)?;

	Ok(Redirect::to(url.as_str()))
}

/// Handles Steam redirecting the user back to us.
#[tracing::instrument(level = "debug", skip_all, err(Debug, level = "debug"))]
async fn callback(
	State(steam_login): State<Arc<SteamLogin>>,
	RawQuery(query): RawQuery,
) -> Result<Response> {
	let params = CallbackParameters::from_query(query.as_deref().unwrap_or_default());
	let login = steam_login.authenticate(&params).await?;

	Ok(Json(login).into_response())
}

/// Fetches a user's profile.
#[tracing::instrument(level = "debug", skip(steam_login), err(Debug, level = "debug"))]
async fn profile(
	State(steam_login): State<Arc<SteamLogin>>,
	Path(steam_id): Path<SteamId>,
) -> Result<Json<ProfileRecord>> {
	steam_login.profile(steam_id).await.map(Json)
}

/// Query parameters for `GET /login/button`.
#[derive(Debug, Deserialize)]
struct ButtonQuery {
	/// `small` or `large`.
	#[serde(default)]
	size: ButtonSize,
}

/// Redirects to Steam's login button image.
async fn button(Query(query): Query<ButtonQuery>) -> Redirect {
	let url = button_url(query.size);

	Redirect::to(&url)
}
