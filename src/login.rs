//! The full login flow, from redirect to profile.

use serde::Serialize;
use steam_id::SteamId;
use url::Url;

use crate::identity::{derive_identity, SteamIdentity};
use crate::openid::{self, CallbackParameters, VerificationOutcome, Verifier};
use crate::profile::{self, ProfileRecord, Resolver};
use crate::{Error, Result};

/// A successful login.
#[derive(Debug)]
pub struct Login {
	/// Who logged in.
	pub identity: SteamIdentity,

	/// Their profile.
	///
	/// Failing to fetch this does not invalidate the login itself.
	pub profile: Result<ProfileRecord, profile::Error>,

	/// Where to send the user next.
	pub redirect_to: Url,
}

/// The JSON shape of a [`Login`].
#[derive(Debug, Serialize)]
#[allow(clippy::missing_docs_in_private_items)]
struct LoginResponse<'a> {
	identity: &'a SteamIdentity,
	profile: Option<&'a ProfileRecord>,
	profile_error: Option<String>,
	redirect_to: &'a str,
}

impl Serialize for Login {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		LoginResponse {
			identity: &self.identity,
			profile: self.profile.as_ref().ok(),
			profile_error: self.profile.as_ref().err().map(ToString::to_string),
			redirect_to: self.redirect_to.as_str(),
		}
		.serialize(serializer)
	}
}

/// Everything needed to log users in with Steam.
#[derive(Debug, Clone)]
pub struct SteamLogin {
	/// The application's public URL.
	realm: Url,

	/// The path Steam sends users back to.
	return_route: String,

	/// Checks assertions with Steam.
	verifier: Verifier,

	/// Fetches profiles.
	resolver: Resolver,
}

impl SteamLogin {
	/// Creates a new [`SteamLogin`].
	pub fn new(
		realm: Url,
		return_route: impl Into<String>,
		verifier: Verifier,
		resolver: Resolver,
	) -> Self {
		Self { realm, return_route: return_route.into(), verifier, resolver }
	}

	/// The application's public URL.
	pub const fn realm(&self) -> &Url {
		&self.realm
	}

	/// The path Steam sends users back to.
	pub fn return_route(&self) -> &str {
		&self.return_route
	}

	/// Builds the URL to redirect a user to for logging in.
	///
	/// After the login they will be sent to `return_target`, or to the site root
	/// if `return_target` is not on our own host.
	pub fn login_url(&self, return_target: &Url) -> Result<Url> {
		openid::login_url(return_target, &self.realm, &self.return_route).map_err(Error::from)
	}

	/// Verifies a callback with Steam and derives the user's identity.
	#[tracing::instrument(level = "debug", skip_all, err(Debug, level = "debug"))]
	pub async fn validate(&self, params: &CallbackParameters) -> Result<SteamIdentity> {
		if !self.is_own_callback(params) {
			tracing::debug!(
				return_to = params.get("return_to"),
				"assertion was issued for a different callback",
			);

			return Err(Error::AuthenticationFailed);
		}

		let VerificationOutcome::Valid(steam_id) = self.verifier.verify(params).await else {
			return Err(Error::AuthenticationFailed);
		};

		derive_identity(&steam_id).map_err(|error| {
			tracing::debug!(%error, steam_id, "steam asserted an unusable SteamID");
			Error::AuthenticationFailed
		})
	}

	/// Whether the signed `openid.return_to` points at our own callback route.
	///
	/// Steam confirms assertions issued to any relying party.
	fn is_own_callback(&self, params: &CallbackParameters) -> bool {
		let Some(return_to) = params.get("return_to").and_then(|url| Url::parse(url).ok()) else {
			return false;
		};

		return_to.host_str() == self.realm.host_str()
			&& return_to.port_or_known_default() == self.realm.port_or_known_default()
			&& return_to.path() == self.return_route
	}

	/// Fetches the profile of `steam_id`.
	///
	/// Unlike during [`SteamLogin::authenticate`], failing to do so is an error.
	#[tracing::instrument(level = "debug", skip(self), err(Debug, level = "debug"))]
	pub async fn profile(&self, steam_id: SteamId) -> Result<ProfileRecord> {
		self.resolver.fetch_profile(steam_id).await.map_err(Error::from)
	}

	/// Runs the full callback: verification, identity, profile, and where to go
	/// next.
	#[tracing::instrument(level = "debug", skip_all, err(Debug, level = "debug"))]
	pub async fn authenticate(&self, params: &CallbackParameters) -> Result<Login> {
		let identity = self.validate(params).await?;
		let profile = match self.resolver.fetch_profile(identity.id64).await {
			Err(error) if error.is_configuration_error() => return Err(Error::Configuration(error)),
			Err(error) => {
				tracing::warn!(%error, steam_id = identity.id64.as_u64(), "failed to fetch profile");
				Err(error)
			}
			Ok(profile) => Ok(profile),
		};

		let redirect_to = openid::post_login_redirect(params, &self.realm, &self.return_route);

		tracing::info!(steam_id = identity.id64.as_u64(), "user logged in");

		Ok(Login { identity, profile, redirect_to })
	}
}

#[cfg(test)]
mod tests {
	use color_eyre::Result;
	use wiremock::matchers::{method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	use super::*;
	use crate::profile::{DataSource, Endpoints};

	const STEAM_ID: &str = "76561197960287930";

	const PROFILE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<profile>
	<steamID><![CDATA[Rabscuttle]]></steamID>
	<onlineState>online</onlineState>
	<stateMessage><![CDATA[Online]]></stateMessage>
	<privacyState>public</privacyState>
	<visibilityState>3</visibilityState>
	<avatarIcon><![CDATA[https://avatars.steamstatic.com/a.jpg]]></avatarIcon>
	<avatarMedium><![CDATA[https://avatars.steamstatic.com/a_medium.jpg]]></avatarMedium>
	<avatarFull><![CDATA[https://avatars.steamstatic.com/a_full.jpg]]></avatarFull>
	<memberSince>September 12, 2003</memberSince>
</profile>"#;

	const RETURN_TO: &str =
		"https://example.com/auth/steam/callback?return=https%3A%2F%2Fexample.com%2Fservers%3Fpage%3D2";

	fn callback_to(claimed_id: &str, return_to: &str) -> CallbackParameters {
		CallbackParameters::from_pairs([
			("openid.ns", openid::OPENID_NS),
			("openid.mode", "id_res"),
			("openid.claimed_id", claimed_id),
			("openid.identity", claimed_id),
			("openid.return_to", return_to),
			("openid.assoc_handle", "1234567890"),
			("openid.signed", "signed,claimed_id,identity,return_to,assoc_handle"),
			("openid.sig", "W0u5DRbtHE1GG0ZKXjerUZDUGmc="),
			("return", "https://example.com/servers?page=2"),
		])
	}

	fn callback(claimed_id: &str) -> CallbackParameters {
		callback_to(claimed_id, RETURN_TO)
	}

	fn genuine_callback() -> CallbackParameters {
		callback(&format!("https://steamcommunity.com/openid/id/{STEAM_ID}"))
	}

	/// Mounts Steam's OpenID endpoint and community profile on one server.
	async fn steam(verification: &str, profile: ResponseTemplate) -> MockServer {
		let server = MockServer::start().await;

		Mock::given(method("POST"))
			.and(path("/openid/login"))
			.respond_with(ResponseTemplate::new(200).set_body_string(verification))
			.mount(&server)
			.await;

		Mock::given(method("GET"))
			.and(path(format!("/profiles/{STEAM_ID}/")))
			.respond_with(profile)
			.mount(&server)
			.await;

		server
	}

	fn steam_login(
		server: &MockServer,
		source: DataSource,
		api_key: Option<&str>,
	) -> Result<SteamLogin> {
		let http_client = reqwest::Client::new();
		let provider_url = Url::parse(&format!("{}/openid/login", server.uri()))?;
		let endpoints = Endpoints {
			community: Url::parse(&server.uri())?,
			web_api: Url::parse(&server.uri())?,
		};

		let verifier = Verifier::new(http_client.clone()).with_provider_url(provider_url);
		let resolver =
			Resolver::new(http_client, source, api_key.map(String::from)).with_endpoints(endpoints);

		Ok(SteamLogin::new(
			Url::parse("https://example.com")?,
			"/auth/steam/callback",
			verifier,
			resolver,
		))
	}

	#[test]
	fn login_url_points_at_steam() -> Result<()> {
		let steam_login = SteamLogin::new(
			Url::parse("https://example.com")?,
			"/auth/steam/callback",
			Verifier::new(reqwest::Client::new()),
			Resolver::new(reqwest::Client::new(), DataSource::Xml, None),
		);

		let url = steam_login.login_url(&Url::parse("https://example.com/maps")?)?;

		assert_eq!(url.host_str(), Some("steamcommunity.com"));
		assert_eq!(url.path(), "/openid/login");
		assert!(url
			.query_pairs()
			.any(|(key, value)| key == "openid.realm" && value == "https://example.com"));

		Ok(())
	}

	#[tokio::test]
	async fn authenticates_genuine_callback() -> Result<()> {
		let server = steam(
			"ns:http://specs.openid.net/auth/2.0\nis_valid:true\n",
			ResponseTemplate::new(200).set_body_string(PROFILE),
		)
		.await;

		let login = steam_login(&server, DataSource::Xml, None)?
			.authenticate(&genuine_callback())
			.await?;

		assert_eq!(login.identity.id2, "STEAM_0:0:11101");
		assert_eq!(login.identity.id3, "[U:1:22202]");
		assert_eq!(login.redirect_to.as_str(), "https://example.com/servers?page=2");

		let profile = login.profile.as_ref().map_err(|error| color_eyre::eyre::eyre!("{error}"))?;

		assert_eq!(profile.name, "Rabscuttle");
		assert_eq!(profile.player_state, "Online");

		let json = serde_json::to_value(&login)?;

		assert_eq!(json["identity"]["steamid"], STEAM_ID);
		assert_eq!(json["profile"]["name"], "Rabscuttle");
		assert!(json["profile_error"].is_null());

		Ok(())
	}

	#[tokio::test]
	async fn rejected_callback_fails() -> Result<()> {
		let server = steam(
			"ns:http://specs.openid.net/auth/2.0\nis_valid:false\n",
			ResponseTemplate::new(200).set_body_string(PROFILE),
		)
		.await;

		let result = steam_login(&server, DataSource::Xml, None)?
			.authenticate(&genuine_callback())
			.await;

		assert!(matches!(result, Err(Error::AuthenticationFailed)), "{result:?}");

		Ok(())
	}

	#[tokio::test]
	async fn assertions_for_other_sites_are_rejected() -> Result<()> {
		let server = steam(
			"ns:http://specs.openid.net/auth/2.0\nis_valid:true\n",
			ResponseTemplate::new(200).set_body_string(PROFILE),
		)
		.await;

		let steam_login = steam_login(&server, DataSource::Xml, None)?;
		let claimed_id = format!("https://steamcommunity.com/openid/id/{STEAM_ID}");

		for return_to in [
			"https://evil.example.org/auth/steam/callback",
			"https://example.com:8443/auth/steam/callback",
			"https://example.com/other/callback",
			"not a url",
		] {
			let result = steam_login.validate(&callback_to(&claimed_id, return_to)).await;

			assert!(matches!(result, Err(Error::AuthenticationFailed)), "{return_to}: {result:?}");
		}

		let without_return_to = CallbackParameters::from_pairs([
			("openid.ns", openid::OPENID_NS),
			("openid.mode", "id_res"),
			("openid.claimed_id", claimed_id.as_str()),
			("openid.identity", claimed_id.as_str()),
			("openid.assoc_handle", "1234567890"),
			("openid.signed", "signed,claimed_id,identity,assoc_handle"),
			("openid.sig", "W0u5DRbtHE1GG0ZKXjerUZDUGmc="),
		]);

		let result = steam_login.validate(&without_return_to).await;

		assert!(matches!(result, Err(Error::AuthenticationFailed)), "{result:?}");

		let requests = server.received_requests().await.unwrap_or_default();

		assert!(requests.is_empty(), "foreign assertions should never reach steam");

		Ok(())
	}

	#[tokio::test]
	async fn out_of_range_steam_id_fails() -> Result<()> {
		let server = steam(
			"ns:http://specs.openid.net/auth/2.0\nis_valid:true\n",
			ResponseTemplate::new(200).set_body_string(PROFILE),
		)
		.await;

		let params = callback("https://steamcommunity.com/openid/id/99999999999999999999");
		let result = steam_login(&server, DataSource::Xml, None)?.validate(&params).await;

		assert!(matches!(result, Err(Error::AuthenticationFailed)), "{result:?}");

		Ok(())
	}

	#[tokio::test]
	async fn profile_failure_is_recoverable() -> Result<()> {
		let server = steam(
			"ns:http://specs.openid.net/auth/2.0\nis_valid:true\n",
			ResponseTemplate::new(503),
		)
		.await;

		let login = steam_login(&server, DataSource::Xml, None)?
			.authenticate(&genuine_callback())
			.await?;

		assert_eq!(login.identity.id64.as_u64(), 76561197960287930);
		assert!(login.profile.is_err());

		let json = serde_json::to_value(&login)?;

		assert!(json["profile"].is_null());
		assert!(json["profile_error"].is_string());

		Ok(())
	}

	#[tokio::test]
	async fn standalone_profile_failure_is_an_error() -> Result<()> {
		let server = steam("is_valid:true\n", ResponseTemplate::new(503)).await;
		let steam_id = SteamId::parse_u64(STEAM_ID)?;

		let result = steam_login(&server, DataSource::Xml, None)?.profile(steam_id).await;

		assert!(matches!(result, Err(Error::UpstreamFetch(_))), "{result:?}");

		let result = steam_login(&server, DataSource::Api, None)?.profile(steam_id).await;

		assert!(matches!(result, Err(Error::Configuration(_))), "{result:?}");

		Ok(())
	}

	#[tokio::test]
	async fn missing_api_key_is_fatal() -> Result<()> {
		let server = steam(
			"ns:http://specs.openid.net/auth/2.0\nis_valid:true\n",
			ResponseTemplate::new(200).set_body_string(PROFILE),
		)
		.await;

		let result = steam_login(&server, DataSource::Api, None)?
			.authenticate(&genuine_callback())
			.await;

		assert!(matches!(result, Err(Error::Configuration(_))), "{result:?}");

		Ok(())
	}
}
