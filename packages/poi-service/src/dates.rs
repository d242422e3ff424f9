use time::{
	Date, OffsetDateTime, PrimitiveDateTime, format_description::well_known::Rfc3339,
	macros::format_description,
};

/// Parses the date shapes seen in source exports. Naive values are taken as UTC.
///
/// Accepts RFC 3339, `YYYY-MM-DD[ |T]HH:MM[:SS[.fff]]`, `YYYY/MM/DD HH:MM[:SS[.fff]]`,
/// `YYYY-MM-DD`, and `YYYY/MM/DD`. Month, day, and hour may omit their leading zero.
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
	let raw = raw.trim();

	if raw.is_empty() {
		return None;
	}
	if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
		return Some(parsed);
	}

	let datetime_formats = [
		format_description!(
			"[year]-[month padding:none]-[day padding:none] [hour padding:none]:[minute]:[second][optional [.[subsecond]]]"
		),
		format_description!(
			"[year]-[month padding:none]-[day padding:none]T[hour padding:none]:[minute]:[second][optional [.[subsecond]]]"
		),
		format_description!(
			"[year]/[month padding:none]/[day padding:none] [hour padding:none]:[minute]:[second][optional [.[subsecond]]]"
		),
		format_description!(
			"[year]-[month padding:none]-[day padding:none] [hour padding:none]:[minute]"
		),
		format_description!(
			"[year]-[month padding:none]-[day padding:none]T[hour padding:none]:[minute]"
		),
		format_description!(
			"[year]/[month padding:none]/[day padding:none] [hour padding:none]:[minute]"
		),
	];

	for format in datetime_formats {
		if let Ok(parsed) = PrimitiveDateTime::parse(raw, format) {
			return Some(parsed.assume_utc());
		}
	}

	let date_formats = [
		format_description!("[year]-[month padding:none]-[day padding:none]"),
		format_description!("[year]/[month padding:none]/[day padding:none]"),
	];

	for format in date_formats {
		if let Ok(parsed) = Date::parse(raw, format) {
			return Some(parsed.midnight().assume_utc());
		}
	}

	None
}

/// Epoch seconds of [`parse_timestamp`].
pub fn parse_epoch_seconds(raw: &str) -> Option<i64> {
	parse_timestamp(raw).map(OffsetDateTime::unix_timestamp)
}
