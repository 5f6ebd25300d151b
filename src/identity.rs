//! The three equivalent encodings of a Steam account.

use serde::Serialize;
use steam_id::{ParseSteamIdError, SteamId};

/// A Steam account in every identifier format.
///
/// `id2` and `id3` are derived from `id64` and never set independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SteamIdentity {
	/// The SteamID64, e.g. `76561197960287930`.
	#[serde(rename = "steamid")]
	pub id64: SteamId,

	/// The legacy SteamID, e.g. `STEAM_0:0:11101`.
	#[serde(rename = "steamid2")]
	pub id2: String,

	/// The SteamID3, e.g. `[U:1:22202]`.
	#[serde(rename = "steamid3")]
	pub id3: String,
}

impl From<SteamId> for SteamIdentity {
	fn from(id64: SteamId) -> Self {
		Self { id64, id2: id64.to_id2(), id3: id64.to_id3() }
	}
}

/// Derives every identifier format from a stringified SteamID64.
pub fn derive_identity(id64: &str) -> Result<SteamIdentity, ParseSteamIdError> {
	SteamId::parse_u64(id64).map(SteamIdentity::from)
}
