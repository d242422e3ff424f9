use poi_storage::RecordMetadata;

use crate::{Error, PoiService, RawRow, Result, dates};

/// What [`PoiService::ensure_loaded`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
	pub inserted: usize,
	/// True when the store already held records and the source was never read.
	pub skipped: bool,
}

impl PoiService {
	/// Loads the source only when the store is empty.
	///
	/// `source` is invoked lazily, so an already populated store never touches the file.
	pub async fn ensure_loaded<F>(&self, source: F) -> Result<LoadReport>
	where
		F: FnOnce() -> Result<Vec<RawRow>>,
	{
		let existing = self.store.count().await?;

		if existing > 0 {
			tracing::info!(existing, "Record store already populated. Skipping load.");

			return Ok(LoadReport { inserted: 0, skipped: true });
		}

		let rows = source()?;
		let inserted = self.load(&rows).await?;

		tracing::info!(inserted, "Record store loaded.");

		Ok(LoadReport { inserted, skipped: false })
	}

	/// Inserts `rows` as one batch, with each row's position as its identifier.
	///
	/// Every date is parsed before anything is written, so a malformed row leaves the store
	/// untouched.
	pub async fn load(&self, rows: &[RawRow]) -> Result<usize> {
		if rows.is_empty() {
			return Ok(0);
		}

		let metadatas = rows
			.iter()
			.enumerate()
			.map(|(row, raw)| to_metadata(row, raw))
			.collect::<Result<Vec<_>>>()?;
		let identifiers: Vec<String> = (0..rows.len()).map(|row| row.to_string()).collect();
		let texts: Vec<String> = rows.iter().map(|raw| raw.text.clone()).collect();

		self.store.add(&identifiers, &texts, &metadatas).await?;

		Ok(rows.len())
	}
}

fn to_metadata(row: usize, raw: &RawRow) -> Result<RecordMetadata> {
	let created_at = dates::parse_epoch_seconds(&raw.created_at)
		.ok_or_else(|| Error::MalformedDate { row, value: raw.created_at.clone() })?;

	Ok(RecordMetadata {
		file_name: raw.file_name.clone(),
		name: raw.name.clone(),
		category: raw.category.clone(),
		address: raw.address.clone(),
		phone: raw.phone.clone(),
		city: raw.city.clone(),
		town: raw.town.clone(),
		created_at,
		alias: None,
	})
}
