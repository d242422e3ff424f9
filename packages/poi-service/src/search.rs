use time::OffsetDateTime;

use poi_storage::{MetadataField, RecordFilter};

use crate::{PoiService, Result};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchRequest {
	pub query: String,
	pub cities: Vec<String>,
	pub categories: Vec<String>,
	#[serde(with = "crate::time_serde")]
	pub start: OffsetDateTime,
	#[serde(default, with = "crate::time_serde::option")]
	pub end: Option<OffsetDateTime>,
}
impl SearchRequest {
	/// City and category membership plus an inclusive creation window.
	pub fn filter(&self) -> RecordFilter {
		RecordFilter::All(vec![
			RecordFilter::any_of(MetadataField::City, self.cities.iter().cloned()),
			RecordFilter::any_of(MetadataField::Category, self.categories.iter().cloned()),
			RecordFilter::between(
				MetadataField::CreatedAt,
				Some(self.start.unix_timestamp()),
				self.end.map(OffsetDateTime::unix_timestamp),
			),
		])
	}
}

impl PoiService {
	/// Names of the nearest records that pass the facet filter and the distance threshold.
	///
	/// An inverted window matches nothing and yields an empty list.
	pub async fn search(&self, req: SearchRequest) -> Result<Vec<String>> {
		let filter = req.filter();
		let candidates =
			self.store.query(&req.query, self.search.candidate_limit, &filter).await?;
		let fetched = candidates.len();
		let kept = self.retain_within(candidates);

		tracing::info!(
			fetched,
			kept = kept.len(),
			max_distance = self.search.max_distance,
			"Search finished."
		);

		Ok(kept.into_iter().map(|candidate| candidate.metadata.name).collect())
	}
}
