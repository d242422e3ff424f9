use std::{
	collections::HashMap,
	sync::{Mutex, MutexGuard},
};

use poi_storage::{
	BoxFuture, Candidate, Error, RecordFilter, RecordMetadata, RecordStore, Result, StoredRecord,
};

/// Distance reported for a query/record pair nobody scripted.
pub const UNSCRIPTED_DISTANCE: f32 = 1.0;

/// One call observed by a [`ScriptedStore`], in arrival order.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreCall {
	Count,
	Add { identifiers: Vec<String> },
	Query { text: String, limit: u32, filter: RecordFilter },
	Get { filter: RecordFilter },
	Update { identifier: String, metadata: RecordMetadata },
}

/// In-process [`RecordStore`] whose distances are scripted per (query text, identifier).
///
/// Filters are evaluated with [`RecordFilter::matches`], lookups return insertion order, and
/// every call is journaled so tests can assert on exactly what the service asked for.
#[derive(Default)]
pub struct ScriptedStore {
	state: Mutex<State>,
}

#[derive(Default)]
struct State {
	records: Vec<Row>,
	distances: HashMap<(String, String), f32>,
	calls: Vec<StoreCall>,
	failure: Option<String>,
}

struct Row {
	identifier: String,
	text: String,
	metadata: RecordMetadata,
}

impl ScriptedStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts a record directly, bypassing the journal.
	pub fn seed(&self, identifier: &str, text: &str, metadata: RecordMetadata) {
		self.lock().records.push(Row {
			identifier: identifier.to_string(),
			text: text.to_string(),
			metadata,
		});
	}

	pub fn set_distance(&self, query: &str, identifier: &str, distance: f32) {
		self.lock().distances.insert((query.to_string(), identifier.to_string()), distance);
	}

	/// Makes every subsequent call fail as if the embedding backend were unreachable.
	pub fn fail_with(&self, message: &str) {
		self.lock().failure = Some(message.to_string());
	}

	pub fn calls(&self) -> Vec<StoreCall> {
		self.lock().calls.clone()
	}

	pub fn add_calls(&self) -> usize {
		self.lock().calls.iter().filter(|call| matches!(call, StoreCall::Add { .. })).count()
	}

	pub fn query_filters(&self) -> Vec<RecordFilter> {
		self.lock()
			.calls
			.iter()
			.filter_map(|call| match call {
				StoreCall::Query { filter, .. } => Some(filter.clone()),
				_ => None,
			})
			.collect()
	}

	pub fn updates(&self) -> Vec<(String, RecordMetadata)> {
		self.lock()
			.calls
			.iter()
			.filter_map(|call| match call {
				StoreCall::Update { identifier, metadata } =>
					Some((identifier.clone(), metadata.clone())),
				_ => None,
			})
			.collect()
	}

	pub fn metadata(&self, identifier: &str) -> Option<RecordMetadata> {
		self.lock()
			.records
			.iter()
			.find(|row| row.identifier == identifier)
			.map(|row| row.metadata.clone())
	}

	pub fn text(&self, identifier: &str) -> Option<String> {
		self.lock().records.iter().find(|row| row.identifier == identifier).map(|row| row.text.clone())
	}

	pub fn len(&self) -> usize {
		self.lock().records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn lock(&self) -> MutexGuard<'_, State> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn record(&self, call: StoreCall) -> Result<MutexGuard<'_, State>> {
		let mut state = self.lock();

		state.calls.push(call);

		if let Some(message) = state.failure.clone() {
			return Err(Error::Embedding(poi_providers::Error::InvalidResponse { message }));
		}

		Ok(state)
	}

	fn count_now(&self) -> Result<u64> {
		let state = self.record(StoreCall::Count)?;

		Ok(state.records.len() as u64)
	}

	fn add_now(
		&self,
		identifiers: &[String],
		texts: &[String],
		metadatas: &[RecordMetadata],
	) -> Result<()> {
		if identifiers.len() != texts.len() || identifiers.len() != metadatas.len() {
			return Err(Error::InvalidArgument("batch length mismatch.".to_string()));
		}

		let mut state = self.record(StoreCall::Add { identifiers: identifiers.to_vec() })?;

		// A batch is written entirely or not at all.
		for (position, identifier) in identifiers.iter().enumerate() {
			if state.records.iter().any(|row| &row.identifier == identifier)
				|| identifiers[..position].contains(identifier)
			{
				return Err(Error::InvalidArgument(format!("duplicate identifier {identifier}.")));
			}
		}

		for ((identifier, text), metadata) in identifiers.iter().zip(texts).zip(metadatas) {
			state.records.push(Row {
				identifier: identifier.clone(),
				text: text.clone(),
				metadata: metadata.clone(),
			});
		}

		Ok(())
	}

	fn query_now(&self, text: &str, limit: u32, filter: &RecordFilter) -> Result<Vec<Candidate>> {
		let state = self.record(StoreCall::Query {
			text: text.to_string(),
			limit,
			filter: filter.clone(),
		})?;
		let mut hits: Vec<Candidate> = state
			.records
			.iter()
			.filter(|row| filter.matches(&row.metadata))
			.map(|row| Candidate {
				identifier: row.identifier.clone(),
				metadata: row.metadata.clone(),
				distance: state
					.distances
					.get(&(text.to_string(), row.identifier.clone()))
					.copied()
					.unwrap_or(UNSCRIPTED_DISTANCE),
			})
			.collect();

		hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
		hits.truncate(limit as usize);

		Ok(hits)
	}

	fn get_now(&self, filter: &RecordFilter) -> Result<Vec<StoredRecord>> {
		let state = self.record(StoreCall::Get { filter: filter.clone() })?;

		Ok(state
			.records
			.iter()
			.filter(|row| filter.matches(&row.metadata))
			.map(|row| StoredRecord {
				identifier: row.identifier.clone(),
				metadata: row.metadata.clone(),
			})
			.collect())
	}

	fn update_now(&self, identifier: &str, metadata: &RecordMetadata) -> Result<()> {
		let mut state = self.record(StoreCall::Update {
			identifier: identifier.to_string(),
			metadata: metadata.clone(),
		})?;
		let row = state.records.iter_mut().find(|row| row.identifier == identifier).ok_or_else(
			|| Error::InvalidArgument(format!("unknown identifier {identifier}.")),
		)?;

		row.metadata = metadata.clone();

		Ok(())
	}
}
impl RecordStore for ScriptedStore {
	fn count(&self) -> BoxFuture<'_, Result<u64>> {
		let result = self.count_now();

		Box::pin(async move { result })
	}

	fn add<'a>(
		&'a self,
		identifiers: &'a [String],
		texts: &'a [String],
		metadatas: &'a [RecordMetadata],
	) -> BoxFuture<'a, Result<()>> {
		let result = self.add_now(identifiers, texts, metadatas);

		Box::pin(async move { result })
	}

	fn query<'a>(
		&'a self,
		text: &'a str,
		limit: u32,
		filter: &'a RecordFilter,
	) -> BoxFuture<'a, Result<Vec<Candidate>>> {
		let result = self.query_now(text, limit, filter);

		Box::pin(async move { result })
	}

	fn get<'a>(&'a self, filter: &'a RecordFilter) -> BoxFuture<'a, Result<Vec<StoredRecord>>> {
		let result = self.get_now(filter);

		Box::pin(async move { result })
	}

	fn update<'a>(
		&'a self,
		identifier: &'a str,
		metadata: &'a RecordMetadata,
	) -> BoxFuture<'a, Result<()>> {
		let result = self.update_now(identifier, metadata);

		Box::pin(async move { result })
	}
}
