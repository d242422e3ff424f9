use poi_storage::{MetadataField, RecordFilter};

use crate::{PoiService, Result};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RenameRequest {
	pub query: String,
	pub target_name: String,
	pub new_name: String,
	pub cities: Vec<String>,
	pub categories: Vec<String>,
}
impl RenameRequest {
	/// Facet membership only. The requery is deliberately not bounded by creation time.
	pub fn filter(&self) -> RecordFilter {
		RecordFilter::All(vec![
			RecordFilter::any_of(MetadataField::City, self.cities.iter().cloned()),
			RecordFilter::any_of(MetadataField::Category, self.categories.iter().cloned()),
		])
	}
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RenameOutcome {
	/// Identifier of the record that received the alias, if the target was found.
	pub renamed: Option<String>,
	/// Display names of the requery results, alias first.
	pub results: Vec<String>,
}

impl PoiService {
	/// Aliases the first record named `target_name`, then reruns the search without a date window.
	///
	/// A missing target is not an error. The requery still runs.
	pub async fn rename(&self, req: RenameRequest) -> Result<RenameOutcome> {
		let matches =
			self.store.get(&RecordFilter::eq(MetadataField::Name, req.target_name.as_str())).await?;
		let renamed = match matches.into_iter().next() {
			Some(mut record) => {
				record.metadata.alias = Some(req.new_name.clone());

				self.store.update(&record.identifier, &record.metadata).await?;

				tracing::info!(
					identifier = %record.identifier,
					target_name = %req.target_name,
					new_name = %req.new_name,
					"Record renamed."
				);

				Some(record.identifier)
			},
			None => {
				tracing::info!(target_name = %req.target_name, "Rename target not found.");

				None
			},
		};
		let candidates =
			self.store.query(&req.query, self.search.candidate_limit, &req.filter()).await?;
		let results = self
			.retain_within(candidates)
			.into_iter()
			.map(|candidate| candidate.metadata.display_name().to_string())
			.collect();

		Ok(RenameOutcome { renamed, results })
	}

	pub async fn rename_and_search(&self, req: RenameRequest) -> Result<Vec<String>> {
		Ok(self.rename(req).await?.results)
	}
}
