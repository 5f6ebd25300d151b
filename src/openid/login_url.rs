use serde::Serialize;
use url::Url;

use super::{IDENTIFIER_SELECT, LOGIN_URL, OPENID_NS, RETURN_PARAM};
use crate::openid::CallbackParameters;

/// Form parameters that will be sent to Steam when redirecting a user for
/// login.
#[derive(Debug, Clone, Serialize)]
#[allow(clippy::missing_docs_in_private_items)]
pub struct LoginForm {
	#[serde(rename = "openid.ns")]
	namespace: &'static str,

	#[serde(rename = "openid.mode")]
	mode: &'static str,

	#[serde(rename = "openid.return_to")]
	return_to: Url,

	#[serde(rename = "openid.realm")]
	realm: String,

	#[serde(rename = "openid.identity")]
	identity: &'static str,

	#[serde(rename = "openid.claimed_id")]
	claimed_id: &'static str,
}

impl LoginForm {
	/// Creates a new [`LoginForm`].
	///
	/// `realm` is the base URL of the application; only its scheme, host and
	/// port are used. `return_route` is the path Steam should send the user
	/// back to.
	#[tracing::instrument(
		level = "trace",
		name = "LoginForm::new",
		skip(realm),
		fields(realm = realm.as_str()),
	)]
	pub fn new(realm: &Url, return_route: &str) -> Result<Self, url::ParseError> {
		let return_to = realm.join(return_route)?;

		Ok(Self {
			namespace: OPENID_NS,
			mode: "checkid_setup",
			return_to,
			realm: realm.origin().ascii_serialization(),
			identity: IDENTIFIER_SELECT,
			claimed_id: IDENTIFIER_SELECT,
		})
	}

	/// Generates an OpenID URL that can be used for logging in with Steam.
	///
	/// Steam will send the user back with a `return` query parameter set to
	/// `return_target`.
	#[tracing::instrument(level = "trace", name = "LoginForm::redirect_to", skip(self))]
	pub fn redirect_to(mut self, return_target: &Url) -> Url {
		self.return_to
			.query_pairs_mut()
			.append_pair(RETURN_PARAM, return_target.as_str());

		let query_string =
			serde_urlencoded::to_string(&self).expect("this is a valid query string");

		let mut url = Url::parse(LOGIN_URL).expect("this is a valid url");

		url.set_query(Some(&query_string));

		url
	}
}

/// Builds the URL to redirect a user to for logging in with Steam.
///
/// `return_target` is where the user should end up after the login process is
/// complete, `realm` is the application's own origin, and `return_route` is
/// the path of the application's callback route.
pub fn login_url(
	return_target: &Url,
	realm: &Url,
	return_route: &str,
) -> Result<Url, url::ParseError> {
	LoginForm::new(realm, return_route).map(|form| form.redirect_to(return_target))
}

/// Determines where to send a user after the callback has been handled.
///
/// This is the `return` parameter injected by [`login_url()`], unless it is
/// missing, unparsable, points at the callback route itself, or points at a
/// different host than `realm`. In all of those cases the user is sent to the
/// site root instead.
pub fn post_login_redirect(params: &CallbackParameters, realm: &Url, return_route: &str) -> Url {
	let root = realm.join("/").unwrap_or_else(|_| realm.clone());

	let Some(target) = params.return_target() else {
		return root;
	};

	let Ok(target) = realm.join(target) else {
		tracing::debug!(target, "discarding unparsable return target");
		return root;
	};

	let same_host = target.host_str() == realm.host_str()
		&& target.port_or_known_default() == realm.port_or_known_default();

	if !same_host {
		tracing::debug!(%target, %realm, "discarding return target on foreign host");
		return root;
	}

	if target.path() == return_route {
		return root;
	}

	target
}
