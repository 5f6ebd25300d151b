use std::fmt;

use serde::{Deserialize, Serialize};

/// A user's presence as reported by the Web API's `personastate` field.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[allow(missing_docs)]
pub enum PersonaState {
	Offline = 0,
	Online = 1,
	Busy = 2,
	Away = 3,
	Snooze = 4,
	LookingToTrade = 5,
	LookingToPlay = 6,
}

/// `personastate` was outside of `0..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown persona state `{0}`")]
pub struct UnknownPersonaState(pub u8);

impl PersonaState {
	/// The human-readable label.
	pub const fn label(&self) -> &'static str {
		match self {
			Self::Offline => "Offline",
			Self::Online => "Online",
			Self::Busy => "Busy",
			Self::Away => "Away",
			Self::Snooze => "Snooze",
			Self::LookingToTrade => "Looking to trade",
			Self::LookingToPlay => "Looking to play",
		}
	}

	/// Whether the user is anything but offline.
	pub const fn is_online(&self) -> bool {
		!matches!(self, Self::Offline)
	}
}

impl fmt::Display for PersonaState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

impl TryFrom<u8> for PersonaState {
	type Error = UnknownPersonaState;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		match value {
			0 => Ok(Self::Offline),
			1 => Ok(Self::Online),
			2 => Ok(Self::Busy),
			3 => Ok(Self::Away),
			4 => Ok(Self::Snooze),
			5 => Ok(Self::LookingToTrade),
			6 => Ok(Self::LookingToPlay),
			_ => Err(UnknownPersonaState(value)),
		}
	}
}

impl From<PersonaState> for u8 {
	#[allow(clippy::as_conversions)]
	fn from(value: PersonaState) -> Self {
		value as u8
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn maps_labels() {
		let labels = (0..=6)
			.map(|value| PersonaState::try_from(value).map(|state| state.label()))
			.collect::<Result<Vec<_>, _>>();

		assert_eq!(
			labels,
			Ok(vec![
				"Offline",
				"Online",
				"Busy",
				"Away",
				"Snooze",
				"Looking to trade",
				"Looking to play",
			])
		);
	}

	#[test]
	fn rejects_unmapped_values() {
		assert_eq!(PersonaState::try_from(7), Err(UnknownPersonaState(7)));
		assert_eq!(PersonaState::try_from(u8::MAX), Err(UnknownPersonaState(u8::MAX)));
		assert!(serde_json::from_str::<PersonaState>("9").is_err());
	}

	#[test]
	fn only_offline_is_offline() {
		assert!(!PersonaState::Offline.is_online());
		assert!(PersonaState::Snooze.is_online());
		assert!(PersonaState::LookingToPlay.is_online());
	}
}
