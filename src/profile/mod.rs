//! Profile information about Steam users.
//!
//! There are two interchangeable sources for this:
//!
//! - the public community profile, rendered as XML ([`DataSource::Xml`])
//! - the official Web API, which requires an API key ([`DataSource::Api`])
//!
//! Both produce the same [`ProfileRecord`], so callers never have to care which
//! one is configured.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use steam_id::SteamId;
use thiserror::Error;
use url::Url;

mod persona_state;
pub use persona_state::{PersonaState, UnknownPersonaState};

mod web_api;
mod xml;

/// Base URL for community profiles.
pub const COMMUNITY_URL: &str = "https://steamcommunity.com";

/// Base URL for the Steam Web API.
pub const WEB_API_URL: &str = "https://api.steampowered.com";

/// Normalized profile information about a Steam user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
	/// The user's display name.
	pub name: String,

	/// The user's real name, if they set one.
	pub real_name: Option<String>,

	/// `Online`, `Offline`, or whatever the community profile reports (e.g.
	/// `In-game`).
	pub player_state: String,

	/// A more detailed description of the user's presence.
	pub state_message: String,

	/// `Public`, `Private`, or `Friendsonly`.
	pub privacy_state: String,

	/// The raw `communityvisibilitystate`.
	pub visibility_state: u8,

	/// 32x32 avatar.
	pub avatar_small: Url,

	/// 64x64 avatar.
	pub avatar_medium: Url,

	/// 184x184 avatar.
	pub avatar_large: Url,

	/// Link to the user's profile, preferring their vanity URL.
	#[serde(rename = "profileURL")]
	pub profile_url: Url,

	/// When the account was created.
	pub joined: Option<String>,
}

/// Which upstream source profile information is fetched from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(clap::ValueEnum)]
pub enum DataSource {
	/// The community profile XML feed.
	#[default]
	Xml,

	/// The `GetPlayerSummaries` Web API endpoint.
	Api,
}

/// Parsing a [`DataSource`] failed.
#[derive(Debug, Clone, Error)]
#[error("unknown data source `{0}`; expected `xml` or `api`")]
pub struct UnknownDataSource(String);

impl FromStr for DataSource {
	type Err = UnknownDataSource;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value {
			"xml" | "Xml" | "XML" => Ok(Self::Xml),
			"api" | "Api" | "API" => Ok(Self::Api),
			_ => Err(UnknownDataSource(value.to_owned())),
		}
	}
}

impl fmt::Display for DataSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Xml => "xml",
			Self::Api => "api",
		})
	}
}

/// The errors that can occur when fetching profile information.
#[derive(Debug, Error)]
pub enum Error {
	/// The Web API was selected, but no API key was configured.
	#[error("Steam API key not specified")]
	MissingApiKey,

	/// We failed to make an HTTP request, or the response had a bad status.
	#[error("failed to make http request")]
	Http(#[from] reqwest::Error),

	/// The community profile was not valid XML, or missing fields.
	#[error("failed to parse profile XML: {0}")]
	Xml(#[from] quick_xml::DeError),

	/// The community profile reported an error instead of a profile.
	#[error("steam returned an error: {0}")]
	Upstream(String),

	/// The Web API returned JSON we could not understand.
	#[error("failed to parse Web API response: {0}")]
	Json(#[from] serde_json::Error),

	/// The Web API returned no players for the requested SteamID.
	#[error("no player with SteamID `{0}`")]
	NoPlayers(SteamId),

	/// The Web API returned a `personastate` we have no label for.
	#[error(transparent)]
	UnknownPersonaState(#[from] UnknownPersonaState),

	/// An upstream URL field was malformed.
	#[error("invalid url: {0}")]
	InvalidUrl(#[from] url::ParseError),
}

impl Error {
	/// Whether this error is caused by the deployment rather than by Steam.
	pub const fn is_configuration_error(&self) -> bool {
		matches!(self, Self::MissingApiKey)
	}
}

/// Where profile information is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
	/// Base URL for `/profiles/<id64>` and `/id/<vanity>`.
	pub community: Url,

	/// Base URL for the Web API.
	pub web_api: Url,
}

impl Default for Endpoints {
	fn default() -> Self {
		Self {
			community: Url::parse(COMMUNITY_URL).expect("hard-coded URL should be valid"),
			web_api: Url::parse(WEB_API_URL).expect("hard-coded URL should be valid"),
		}
	}
}

/// Fetches [`ProfileRecord`]s from the configured [`DataSource`].
#[derive(Clone)]
pub struct Resolver {
	/// Client used for all upstream requests.
	http_client: reqwest::Client,

	/// Which source to fetch from.
	source: DataSource,

	/// Web API key, required for [`DataSource::Api`].
	api_key: Option<String>,

	/// Upstream base URLs.
	endpoints: Endpoints,
}

impl fmt::Debug for Resolver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Resolver")
			.field("source", &self.source)
			.field("api_key", &self.api_key.as_ref().map(|_| "*****"))
			.field("endpoints", &self.endpoints)
			.finish_non_exhaustive()
	}
}

impl Resolver {
	/// Creates a new [`Resolver`].
	///
	/// An empty `api_key` is treated as if none was given.
	pub fn new(http_client: reqwest::Client, source: DataSource, api_key: Option<String>) -> Self {
		Self {
			http_client,
			source,
			api_key: api_key.filter(|key| !key.is_empty()),
			endpoints: Endpoints::default(),
		}
	}

	/// Fetches from `endpoints` instead of Steam.
	pub fn with_endpoints(self, endpoints: Endpoints) -> Self {
		Self { endpoints, ..self }
	}

	/// The configured [`DataSource`].
	pub const fn source(&self) -> DataSource {
		self.source
	}

	/// Checks that the configured source can be used at all.
	///
	/// This never touches the network.
	pub fn check_config(&self) -> Result<(), Error> {
		match (self.source, &self.api_key) {
			(DataSource::Api, None) => Err(Error::MissingApiKey),
			_ => Ok(()),
		}
	}

	/// Fetches profile information about `steam_id`.
	#[tracing::instrument(
		level = "debug",
		skip(self),
		fields(source = %self.source),
		err(Debug, level = "debug"),
	)]
	pub async fn fetch_profile(&self, steam_id: SteamId) -> Result<ProfileRecord, Error> {
		match (self.source, self.api_key.as_deref()) {
			(DataSource::Xml, _) => {
				xml::fetch(&self.http_client, &self.endpoints.community, steam_id).await
			}
			(DataSource::Api, Some(api_key)) => {
				web_api::fetch(&self.http_client, &self.endpoints.web_api, api_key, steam_id).await
			}
			(DataSource::Api, None) => Err(Error::MissingApiKey),
		}
	}
}

/// Builds `<community>/profiles/<id64>`.
fn profile_url(community: &Url, steam_id: SteamId) -> Result<Url, url::ParseError> {
	community.join(&format!("/profiles/{}", steam_id.as_u64()))
}

/// Builds `<community>/id/<vanity>`.
fn vanity_url(community: &Url, vanity: &str) -> Result<Url, url::ParseError> {
	community.join(&format!("/id/{vanity}"))
}

/// Upper-cases the first character, like the community profile's labels
/// expect.
fn capitalize(value: &str) -> String {
	let mut chars = value.chars();

	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}
