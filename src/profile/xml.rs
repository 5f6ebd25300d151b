//! The community profile XML feed (`/profiles/<id64>/?xml=1`).

use serde::Deserialize;
use steam_id::SteamId;
use url::Url;

use super::{capitalize, profile_url, vanity_url, Error, ProfileRecord};

/// The fields we care about from the XML feed.
///
/// Everything is optional so that error documents (`<response><error>…`) and
/// incomplete profiles can be told apart from malformed XML.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::missing_docs_in_private_items)]
struct Feed {
	#[serde(rename = "steamID")]
	name: Option<String>,

	#[serde(rename = "realname")]
	real_name: Option<String>,

	online_state: Option<String>,
	state_message: Option<String>,
	privacy_state: Option<String>,
	visibility_state: Option<u8>,
	avatar_icon: Option<String>,
	avatar_medium: Option<String>,
	avatar_full: Option<String>,

	#[serde(rename = "customURL")]
	custom_url: Option<String>,

	#[serde(alias = "joined")]
	member_since: Option<String>,

	error: Option<String>,
}

/// Fetches and maps the XML feed for `steam_id`.
pub(super) async fn fetch(
	http_client: &reqwest::Client,
	community: &Url,
	steam_id: SteamId,
) -> Result<ProfileRecord, Error> {
	let mut url = community.join(&format!("/profiles/{}/", steam_id.as_u64()))?;

	url.query_pairs_mut().append_pair("xml", "1");

	tracing::debug!(%url, "making http request to steam");

	let response = http_client.get(url).send().await?;

	if let Err(error) = response.error_for_status_ref() {
		let response_body = response.text().await.ok();

		tracing::error! {
			?error,
			?response_body,
			"failed to fetch profile information from steam",
		};

		return Err(Error::Http(error));
	}

	let body = response.text().await?;

	parse(&body, community, steam_id)
}

/// Maps the raw XML document onto a [`ProfileRecord`].
fn parse(body: &str, community: &Url, steam_id: SteamId) -> Result<ProfileRecord, Error> {
	let feed = quick_xml::de::from_str::<Feed>(body)?;

	if let Some(error) = non_empty(feed.error) {
		return Err(Error::Upstream(error));
	}

	let profile_url = match non_empty(feed.custom_url) {
		Some(vanity) => vanity_url(community, &vanity)?,
		None => profile_url(community, steam_id)?,
	};

	Ok(ProfileRecord {
		name: required(feed.name, "steamID")?,
		real_name: non_empty(feed.real_name),
		player_state: capitalize(&required(feed.online_state, "onlineState")?),
		state_message: feed.state_message.unwrap_or_default(),
		privacy_state: capitalize(&required(feed.privacy_state, "privacyState")?),
		visibility_state: feed
			.visibility_state
			.ok_or_else(|| missing("visibilityState"))?,
		avatar_small: required(feed.avatar_icon, "avatarIcon")?.parse()?,
		avatar_medium: required(feed.avatar_medium, "avatarMedium")?.parse()?,
		avatar_large: required(feed.avatar_full, "avatarFull")?.parse()?,
		profile_url,
		joined: non_empty(feed.member_since),
	})
}

/// Treats empty elements like missing ones.
fn non_empty(value: Option<String>) -> Option<String> {
	value
		.map(|value| value.trim().to_owned())
		.filter(|value| !value.is_empty())
}

/// Requires a non-empty element.
fn required(value: Option<String>, element: &'static str) -> Result<String, Error> {
	non_empty(value).ok_or_else(|| missing(element))
}

/// The error for a missing `element`.
fn missing(element: &str) -> Error {
	Error::Upstream(format!("profile is missing `<{element}>`"))
}
