//! The `ISteamUser/GetPlayerSummaries` Web API endpoint.

use chrono::{DateTime, Datelike};
use serde::{Deserialize, Serialize};
use steam_id::SteamId;
use url::Url;

use super::{Error, PersonaState, ProfileRecord};

/// Path of the endpoint, relative to the Web API base URL.
const PLAYER_SUMMARIES_PATH: &str = "/ISteamUser/GetPlayerSummaries/v0002/";

/// Query parameters for the request.
#[derive(Serialize)]
#[allow(clippy::missing_docs_in_private_items)]
struct Query<'a> {
	key: &'a str,

	#[serde(serialize_with = "SteamId::serialize_u64")]
	steamids: SteamId,
}

/// `{ "response": { "players": [...] } }`
#[derive(Debug, Deserialize)]
#[allow(clippy::missing_docs_in_private_items)]
struct Summaries {
	response: Players,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::missing_docs_in_private_items)]
struct Players {
	#[serde(default)]
	players: Vec<Player>,
}

/// A single entry of `players`, with only the fields we use.
#[derive(Debug, Deserialize)]
#[allow(clippy::missing_docs_in_private_items)]
struct Player {
	personaname: String,
	realname: Option<String>,
	personastate: u8,
	communityvisibilitystate: u8,
	avatar: Url,
	avatarmedium: Url,
	avatarfull: Url,
	profileurl: String,
	timecreated: Option<i64>,
}

/// Fetches and maps the player summary for `steam_id`.
pub(super) async fn fetch(
	http_client: &reqwest::Client,
	web_api: &Url,
	api_key: &str,
	steam_id: SteamId,
) -> Result<ProfileRecord, Error> {
	let url = web_api.join(PLAYER_SUMMARIES_PATH)?;

	tracing::debug!(%url, "making http request to steam");

	let response = http_client
		.get(url)
		.query(&Query { key: api_key, steamids: steam_id })
		.send()
		.await?;

	if let Err(error) = response.error_for_status_ref() {
		let response_body = response.text().await.ok();

		tracing::error! {
			?error,
			?response_body,
			"failed to fetch player summary from steam",
		};

		return Err(Error::Http(error));
	}

	let body = response.text().await?;

	parse(&body, steam_id)
}

/// Maps the raw JSON response onto a [`ProfileRecord`].
fn parse(body: &str, steam_id: SteamId) -> Result<ProfileRecord, Error> {
	let summaries = serde_json::from_str::<Summaries>(body)?;
	let player = summaries
		.response
		.players
		.into_iter()
		.next()
		.ok_or(Error::NoPlayers(steam_id))?;

	let persona_state = PersonaState::try_from(player.personastate)?;
	let privacy_state = match player.communityvisibilitystate {
		1 | 2 => "Private",
		_ => "Public",
	};

	Ok(ProfileRecord {
		name: player.personaname,
		real_name: player.realname.filter(|name| !name.is_empty()),
		player_state: String::from(if persona_state.is_online() { "Online" } else { "Offline" }),
		state_message: String::from(persona_state.label()),
		privacy_state: String::from(privacy_state),
		visibility_state: player.communityvisibilitystate,
		avatar_small: player.avatar,
		avatar_medium: player.avatarmedium,
		avatar_large: player.avatarfull,
		profile_url: force_https(&player.profileurl)?,
		joined: player.timecreated.and_then(format_joined),
	})
}

/// Steam still hands out `http://` profile links.
fn force_https(url: &str) -> Result<Url, url::ParseError> {
	match url.strip_prefix("http://") {
		Some(rest) => format!("https://{rest}").parse(),
		None => url.parse(),
	}
}

/// Formats a UNIX timestamp like `September 12th, 2003`.
fn format_joined(timestamp: i64) -> Option<String> {
	let date = DateTime::from_timestamp(timestamp, 0)?;
	let day = date.day();
	let suffix = match (day % 10, day % 100) {
		(_, 11..=13) => "th",
		(1, _) => "st",
		(2, _) => "nd",
		(3, _) => "rd",
		_ => "th",
	};

	Some(format!("{} {day}{suffix}, {}", date.format("%B"), date.year()))
}
