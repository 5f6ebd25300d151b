//! Method and Trait implementations when depending on [`serde`].

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, Unexpected};
use serde::ser::{Serialize, Serializer};

use crate::SteamId;

impl SteamId {
	/// Serialize as a 64-bit integer.
	pub fn serialize_u64<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		self.as_u64().serialize(serializer)
	}

	/// Serialize as a stringified 64-bit integer.
	pub fn serialize_u64_stringified<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		format_args!("{}", self.as_u64()).serialize(serializer)
	}

	/// Serialize in the `STEAM_0:Y:Z` format.
	pub fn serialize_id2<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		format_args!("{self}").serialize(serializer)
	}

	/// Serialize in the `[U:1:N]` format.
	pub fn serialize_id3<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		format_args!("[U:1:{}]", self.as_u32()).serialize(serializer)
	}
}

/// SteamIDs serialize as stringified 64-bit integers, since most JSON consumers can't represent
/// them as numbers without losing precision.
impl Serialize for SteamId {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		self.serialize_u64_stringified(serializer)
	}
}

impl<'de> Deserialize<'de> for SteamId {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		deserializer.deserialize_any(Visitor)
	}
}

/// Accepts integers and any textual format.
struct Visitor;

impl de::Visitor<'_> for Visitor {
	type Value = SteamId;

	fn expecting(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(fmt, "a SteamID")
	}

	fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
		SteamId::from_u64(value)
			.map_err(|_| de::Error::invalid_value(Unexpected::Unsigned(value), &self))
	}

	fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
		u64::try_from(value)
			.map_err(|_| de::Error::invalid_value(Unexpected::Signed(value), &self))
			.and_then(|value| self.visit_u64(value))
	}

	fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
		value
			.parse::<SteamId>()
			.map_err(|_| de::Error::invalid_value(Unexpected::Str(value), &self))
	}
}
