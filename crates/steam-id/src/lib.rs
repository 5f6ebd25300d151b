/* Copyright (C) 2024  AlphaKeks <alphakeks@dawn.sh>
 *
 * This library is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This library is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this repository.  If not, see <https://www.gnu.org/licenses/>.
 */

//! A type for working with [Valve's SteamIDs].
//!
//! Steam identifies every account with a 64-bit integer ("SteamID64"), but there are two other
//! textual encodings in common use:
//!
//! - the legacy `STEAM_X:Y:Z` format ("SteamID", "id2")
//! - the `[U:1:N]` format ("SteamID3", "id3")
//!
//! [`SteamId`] stores the 64-bit value and converts between all three without ever leaving
//! integer arithmetic.
//!
//! [Valve's SteamIDs]: https://developer.valvesoftware.com/wiki/SteamID

use std::fmt::{self, Display, Formatter};
use std::num::ParseIntError;
use std::str::FromStr;

use thiserror::Error;

#[cfg(feature = "serde")]
mod serde;

/// A SteamID.
///
/// This is a thin wrapper around a 64-bit integer that is guaranteed to be within
/// [`SteamId::MIN`]`..=`[`SteamId::MAX`].
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SteamId(u64);

impl SteamId {
	/// The smallest valid SteamID64.
	///
	/// This is also the offset between the 64-bit and the 32-bit representation.
	pub const MIN: Self = Self(76561197960265728_u64);

	/// The largest valid SteamID64.
	///
	/// SteamID3 account IDs are 32-bit, so nothing above `MIN + u32::MAX` can be represented in
	/// every format.
	#[allow(clippy::as_conversions)]
	pub const MAX: Self = Self(Self::MIN.0 + (u32::MAX as u64));

	/// Creates a [`SteamId`] from a 64-bit integer.
	pub const fn from_u64(value: u64) -> Result<Self, OutOfRange> {
		if Self::MIN.0 <= value && value <= Self::MAX.0 {
			Ok(Self(value))
		} else {
			Err(OutOfRange { value })
		}
	}

	/// Creates a [`SteamId`] from its 32-bit representation (the `N` in `[U:1:N]`).
	#[allow(clippy::as_conversions, clippy::cast_lossless)]
	pub const fn from_u32(value: u32) -> Self {
		Self(Self::MIN.0 + (value as u64))
	}

	/// Creates a [`SteamId`] from the `Y` and `Z` segments of `STEAM_X:Y:Z`.
	pub fn from_parts(parity: u64, account_number: u64) -> Result<Self, OutOfRange> {
		let offset = account_number
			.checked_mul(2)
			.and_then(|z| z.checked_add(parity & 1))
			.ok_or(OutOfRange { value: u64::MAX })?;

		let value = Self::MIN
			.0
			.checked_add(offset)
			.ok_or(OutOfRange { value: u64::MAX })?;

		Self::from_u64(value)
	}

	/// Returns the underlying 64-bit integer.
	pub const fn as_u64(&self) -> u64 {
		self.0
	}

	/// Returns the `Y` segment in `STEAM_X:Y:Z`.
	///
	/// This will always be 0 or 1.
	pub const fn parity(&self) -> u64 {
		(self.0 - Self::MIN.0) & 1
	}

	/// Returns the `Z` segment in `STEAM_X:Y:Z`.
	pub const fn account_number(&self) -> u64 {
		(self.0 - Self::MIN.0 - self.parity()) / 2
	}

	/// Returns the 32-bit representation (the `N` in `[U:1:N]`).
	#[allow(clippy::as_conversions, clippy::cast_possible_truncation)]
	pub const fn as_u32(&self) -> u32 {
		// `MAX` guarantees this fits
		((self.account_number() * 2) + self.parity()) as u32
	}

	/// Formats this SteamID as `STEAM_0:Y:Z`.
	pub fn to_id2(&self) -> String {
		format!("STEAM_0:{}:{}", self.parity(), self.account_number())
	}

	/// Formats this SteamID as `[U:1:N]`.
	pub fn to_id3(&self) -> String {
		format!("[U:1:{}]", self.as_u32())
	}

	/// Parses a SteamID in the `STEAM_X:Y:Z` format.
	///
	/// `X` is accepted as either 0 or 1; it does not affect the result.
	pub fn from_id2(value: &str) -> Result<Self, ParseId2Error> {
		let value = value
			.strip_prefix("STEAM_")
			.ok_or(ParseId2Error::MissingPrefix)?;

		let mut segments = value.split(':');

		match segments.next() {
			Some("0" | "1") => {}
			Some(_) => return Err(ParseId2Error::InvalidX),
			None => return Err(ParseId2Error::MissingX),
		}

		let y = segments
			.next()
			.ok_or(ParseId2Error::MissingY)?
			.parse::<u64>()
			.map_err(|err| ParseId2Error::InvalidY(Some(err)))?;

		if y > 1 {
			return Err(ParseId2Error::InvalidY(None));
		}

		let z = segments
			.next()
			.ok_or(ParseId2Error::MissingZ)?
			.parse::<u64>()
			.map_err(ParseId2Error::InvalidZ)?;

		if segments.next().is_some() {
			return Err(ParseId2Error::TrailingSegments);
		}

		Ok(Self::from_parts(y, z)?)
	}

	/// Parses a SteamID in the `[U:1:N]` format.
	///
	/// The surrounding brackets are optional.
	pub fn from_id3(value: &str) -> Result<Self, ParseId3Error> {
		let value = match (value.strip_prefix('['), value.ends_with(']')) {
			(Some(inner), true) => inner.strip_suffix(']').unwrap_or(inner),
			(None, false) => value,
			(Some(_), false) | (None, true) => return Err(ParseId3Error::InconsistentBrackets),
		};

		let mut segments = value.split(':');

		let Some("U") = segments.next() else {
			return Err(ParseId3Error::MissingAccountType);
		};

		let Some("1") = segments.next() else {
			return Err(ParseId3Error::MissingOne);
		};

		let id = segments
			.next()
			.ok_or(ParseId3Error::MissingId)?
			.parse::<u32>()
			.map_err(ParseId3Error::InvalidId)?;

		if segments.next().is_some() {
			return Err(ParseId3Error::TrailingSegments);
		}

		Ok(Self::from_u32(id))
	}
}

/// A value was not within [`SteamId::MIN`]`..=`[`SteamId::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{value} is out of range for a valid SteamID64")]
pub struct OutOfRange {
	/// The rejected value.
	pub value: u64,
}

/// Parsing a stringified SteamID64 failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseSteamIdError {
	/// The string was not a (64-bit) integer.
	#[error("SteamID64 is not a valid integer: {0}")]
	NotAnInteger(#[from] ParseIntError),

	/// The integer was out of range.
	#[error(transparent)]
	OutOfRange(#[from] OutOfRange),
}

/// Parsing a `STEAM_X:Y:Z` string failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseId2Error {
	/// Every SteamID starts with `STEAM_`.
	#[error("missing `STEAM_` prefix")]
	MissingPrefix,

	/// The SteamID ended after the `STEAM_` prefix.
	#[error("missing `X` segment")]
	MissingX,

	/// The `X` segment was something other than 0 or 1.
	#[error("invalid `X` segment; expected 0 or 1")]
	InvalidX,

	/// The SteamID was missing the `Y` segment.
	#[error("missing `Y` segment")]
	MissingY,

	/// The `Y` segment was something other than 0 or 1.
	#[error("invalid `Y` segment; expected 0 or 1{}", match .0 {
		None => String::new(),
		Some(err) => format!(" ({err})"),
	})]
	InvalidY(Option<ParseIntError>),

	/// The SteamID was missing the `Z` segment.
	#[error("missing `Z` segment")]
	MissingZ,

	/// The `Z` segment was not a valid integer.
	#[error("invalid `Z` segment: {0}")]
	InvalidZ(ParseIntError),

	/// There was something after the `Z` segment.
	#[error("unexpected segments after `Z`")]
	TrailingSegments,

	/// The resulting value was out of range.
	#[error(transparent)]
	OutOfRange(#[from] OutOfRange),
}

/// Parsing a `[U:1:N]` string failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseId3Error {
	/// Got one of, but not both, opening or closing bracket.
	#[error("got one of, but not both, opening or closing bracket")]
	InconsistentBrackets,

	/// The first segment must be `U` (individual account).
	#[error("missing `U` segment specifying account type")]
	MissingAccountType,

	/// The second segment is always `1`.
	#[error("missing `1` segment")]
	MissingOne,

	/// The third segment is the 32-bit ID.
	#[error("missing ID segment")]
	MissingId,

	/// The ID segment was not a valid `u32`.
	#[error("invalid 32-bit SteamID: {0}")]
	InvalidId(ParseIntError),

	/// There was something after the ID segment.
	#[error("unexpected segments after ID")]
	TrailingSegments,
}

/// A string could not be parsed as any known SteamID format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSteamId {
	/// The string was an integer, but not a valid SteamID64.
	#[error(transparent)]
	OutOfRange(#[from] OutOfRange),

	/// The string was not in any recognized format.
	#[error("failed to parse SteamID (unrecognized format)")]
	UnrecognizedFormat,
}

impl Display for SteamId {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "STEAM_0:{}:{}", self.parity(), self.account_number())
	}
}

impl From<SteamId> for u64 {
	fn from(value: SteamId) -> Self {
		value.as_u64()
	}
}

impl TryFrom<u64> for SteamId {
	type Error = OutOfRange;

	fn try_from(value: u64) -> Result<Self, Self::Error> {
		Self::from_u64(value)
	}
}

impl FromStr for SteamId {
	type Err = InvalidSteamId;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if let Ok(int) = s.parse::<u64>() {
			return Self::from_u64(int).map_err(Into::into);
		}

		if let Ok(steam_id) = Self::from_id2(s) {
			return Ok(steam_id);
		}

		if let Ok(steam_id) = Self::from_id3(s) {
			return Ok(steam_id);
		}

		Err(InvalidSteamId::UnrecognizedFormat)
	}
}

impl SteamId {
	/// Parses a stringified SteamID64, rejecting every other format.
	pub fn parse_u64(value: &str) -> Result<Self, ParseSteamIdError> {
		Ok(Self::from_u64(value.parse::<u64>()?)?)
	}
}
