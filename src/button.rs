//! Steam's official "Sign in through Steam" button images.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Base URL of the button images.
const BUTTON_BASE_URL: &str = "https://steamcommunity-a.akamaihd.net/public/images/signinthroughsteam";

/// Which button image to use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum ButtonSize {
	/// `sits_01.png`
	Small,

	/// `sits_02.png`
	#[default]
	Large,
}

impl FromStr for ButtonSize {
	type Err = Infallible;

	/// Anything but `small` is [`ButtonSize::Large`].
	fn from_str(value: &str) -> Result<Self, Self::Err> {
		Ok(if value.eq_ignore_ascii_case("small") { Self::Small } else { Self::Large })
	}
}

impl From<String> for ButtonSize {
	fn from(value: String) -> Self {
		match value.parse() {
			Ok(size) => size,
			Err(infallible) => match infallible {},
		}
	}
}

impl fmt::Display for ButtonSize {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Small => "small",
			Self::Large => "large",
		})
	}
}

/// The image URL for a login button of the given `size`.
pub fn button_url(size: ButtonSize) -> String {
	let image = match size {
		ButtonSize::Small => "sits_01.png",
		ButtonSize::Large => "sits_02.png",
	};

	format!("{BUTTON_BASE_URL}/{image}")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn picks_image_by_size() {
		assert_eq!(
			button_url(ButtonSize::Small),
			"https://steamcommunity-a.akamaihd.net/public/images/signinthroughsteam/sits_01.png"
		);
		assert_eq!(
			button_url(ButtonSize::Large),
			"https://steamcommunity-a.akamaihd.net/public/images/signinthroughsteam/sits_02.png"
		);
	}

	#[test]
	fn anything_but_small_is_large() {
		assert_eq!("small".parse(), Ok(ButtonSize::Small));
		assert_eq!("SMALL".parse(), Ok(ButtonSize::Small));
		assert_eq!("large".parse(), Ok(ButtonSize::Large));
		assert_eq!("huge".parse(), Ok(ButtonSize::Large));
		assert_eq!("".parse(), Ok(ButtonSize::Large));
	}
}
