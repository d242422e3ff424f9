use serde_json::Value;

use crate::models::{
	FIELD_CATEGORY, FIELD_CITY, FIELD_CREATED_AT, FIELD_NAME, FIELD_TOWN, RecordMetadata,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetadataField {
	Name,
	Category,
	City,
	Town,
	CreatedAt,
}
impl MetadataField {
	pub fn payload_key(&self) -> &'static str {
		match self {
			Self::Name => FIELD_NAME,
			Self::Category => FIELD_CATEGORY,
			Self::City => FIELD_CITY,
			Self::Town => FIELD_TOWN,
			Self::CreatedAt => FIELD_CREATED_AT,
		}
	}

	fn keyword<'a>(&self, meta: &'a RecordMetadata) -> Option<&'a str> {
		match self {
			Self::Name => Some(meta.name.as_str()),
			Self::Category => Some(meta.category.as_str()),
			Self::City => Some(meta.city.as_str()),
			Self::Town => Some(meta.town.as_str()),
			Self::CreatedAt => None,
		}
	}

	fn integer(&self, meta: &RecordMetadata) -> Option<i64> {
		match self {
			Self::CreatedAt => Some(meta.created_at),
			_ => None,
		}
	}
}

/// Structured metadata predicate understood by every [`crate::RecordStore`].
#[derive(Clone, Debug, PartialEq)]
pub enum RecordFilter {
	/// Conjunction. An empty conjunction matches everything.
	All(Vec<RecordFilter>),
	Eq { field: MetadataField, value: String },
	/// Set membership. An empty set matches nothing.
	In { field: MetadataField, values: Vec<String> },
	/// Inclusive integer range. A missing bound is open.
	Range { field: MetadataField, gte: Option<i64>, lte: Option<i64> },
}
impl RecordFilter {
	pub fn eq(field: MetadataField, value: impl Into<String>) -> Self {
		Self::Eq { field, value: value.into() }
	}

	pub fn any_of<I, S>(field: MetadataField, values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::In { field, values: values.into_iter().map(Into::into).collect() }
	}

	pub fn between(field: MetadataField, gte: Option<i64>, lte: Option<i64>) -> Self {
		Self::Range { field, gte, lte }
	}

	pub fn matches(&self, meta: &RecordMetadata) -> bool {
		match self {
			Self::All(nodes) => nodes.iter().all(|node| node.matches(meta)),
			Self::Eq { field, value } => field.keyword(meta) == Some(value.as_str()),
			Self::In { field, values } => field
				.keyword(meta)
				.map(|actual| values.iter().any(|value| value == actual))
				.unwrap_or(false),
			Self::Range { field, gte, lte } => {
				let Some(actual) = field.integer(meta) else {
					return false;
				};

				gte.is_none_or(|low| actual >= low) && lte.is_none_or(|high| actual <= high)
			},
		}
	}

	/// True when no record can ever match, so a store may answer without a round trip.
	pub fn is_unsatisfiable(&self) -> bool {
		match self {
			Self::All(nodes) => nodes.iter().any(Self::is_unsatisfiable),
			Self::Eq { .. } => false,
			Self::In { values, .. } => values.is_empty(),
			Self::Range { gte: Some(low), lte: Some(high), .. } => low > high,
			Self::Range { .. } => false,
		}
	}

	/// Whether any clause, at any depth, constrains `field`.
	pub fn constrains(&self, field: MetadataField) -> bool {
		match self {
			Self::All(nodes) => nodes.iter().any(|node| node.constrains(field)),
			Self::Eq { field: own, .. }
			| Self::In { field: own, .. }
			| Self::Range { field: own, .. } => *own == field,
		}
	}

	pub fn to_value(&self) -> Value {
		match self {
			Self::All(nodes) => serde_json::json!({
				"$and": Value::Array(nodes.iter().map(Self::to_value).collect()),
			}),
			Self::Eq { field, value } => serde_json::json!({ field.payload_key(): value }),
			Self::In { field, values } => {
				serde_json::json!({ field.payload_key(): { "$in": values } })
			},
			Self::Range { field, gte, lte } => {
				serde_json::json!({ field.payload_key(): { "$gte": gte, "$lte": lte } })
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn cafe() -> RecordMetadata {
		RecordMetadata {
			file_name: None,
			name: "Old Cafe".to_string(),
			category: "Cafe".to_string(),
			address: "1 Road".to_string(),
			phone: "02-0000".to_string(),
			city: "Taipei".to_string(),
			town: "Daan".to_string(),
			created_at: 1_577_836_800,
			alias: None,
		}
	}

	#[test]
	fn conjunction_requires_every_clause() {
		let filter = RecordFilter::All(vec![
			RecordFilter::any_of(MetadataField::City, ["Taipei", "Tainan"]),
			RecordFilter::any_of(MetadataField::Category, ["Cafe"]),
			RecordFilter::between(MetadataField::CreatedAt, Some(1_546_300_800), Some(1_609_459_200)),
		]);

		assert!(filter.matches(&cafe()));

		let mut elsewhere = cafe();

		elsewhere.city = "Hualien".to_string();

		assert!(!filter.matches(&elsewhere));
	}

	#[test]
	fn range_bounds_are_inclusive() {
		let at = cafe().created_at;

		assert!(RecordFilter::between(MetadataField::CreatedAt, Some(at), Some(at)).matches(&cafe()));
		assert!(!RecordFilter::between(MetadataField::CreatedAt, Some(at + 1), None).matches(&cafe()));
		assert!(RecordFilter::between(MetadataField::CreatedAt, None, Some(at)).matches(&cafe()));
	}

	#[test]
	fn range_on_keyword_field_never_matches() {
		assert!(!RecordFilter::between(MetadataField::City, Some(0), None).matches(&cafe()));
	}

	#[test]
	fn alias_is_not_a_filterable_name() {
		let mut renamed = cafe();

		renamed.alias = Some("New Cafe Name".to_string());

		assert!(!RecordFilter::eq(MetadataField::Name, "New Cafe Name").matches(&renamed));
		assert!(RecordFilter::eq(MetadataField::Name, "Old Cafe").matches(&renamed));
	}

	#[test]
	fn empty_membership_is_unsatisfiable() {
		let filter = RecordFilter::All(vec![
			RecordFilter::any_of(MetadataField::City, Vec::<String>::new()),
			RecordFilter::any_of(MetadataField::Category, ["Cafe"]),
		]);

		assert!(filter.is_unsatisfiable());
		assert!(!filter.matches(&cafe()));
		assert!(RecordFilter::between(MetadataField::CreatedAt, Some(2), Some(1)).is_unsatisfiable());
		assert!(!RecordFilter::All(Vec::new()).is_unsatisfiable());
	}

	#[test]
	fn renders_store_style_expression() {
		let filter = RecordFilter::All(vec![
			RecordFilter::any_of(MetadataField::City, ["Taipei"]),
			RecordFilter::between(MetadataField::CreatedAt, Some(1), Some(2)),
		]);

		assert_eq!(
			filter.to_value(),
			serde_json::json!({
				"$and": [
					{ "city": { "$in": ["Taipei"] } },
					{ "date": { "$gte": 1, "$lte": 2 } }
				]
			})
		);
	}
}
