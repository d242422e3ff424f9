//! Serde adapters for request timestamps. Output is RFC 3339; input is anything
//! [`crate::dates::parse_timestamp`] understands, so callers may pass a bare date.

use serde::{Deserialize, Deserializer, Serializer, de::Error as _, ser::Error as _};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	serializer.serialize_str(&value.format(&Rfc3339).map_err(S::Error::custom)?)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	parse::<D>(String::deserialize(deserializer)?)
}

fn parse<'de, D>(raw: String) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	crate::dates::parse_timestamp(&raw)
		.ok_or_else(|| D::Error::custom(format!("unrecognized timestamp {raw:?}")))
}

pub mod option {
	use super::*;

	pub fn serialize<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match value {
			Some(value) => super::serialize(value, serializer),
			None => serializer.serialize_none(),
		}
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
	where
		D: Deserializer<'de>,
	{
		Option::<String>::deserialize(deserializer)?.map(parse::<D>).transpose()
	}
}
