use std::{collections::HashMap, sync::Arc};

use qdrant_client::{
	Payload, Qdrant,
	qdrant::{
		Condition, CountPointsBuilder, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder,
		Distance, FieldType, Filter, PointId, PointStruct, PointsIdsList, Query,
		QueryPointsBuilder, Range, ScrollPointsBuilder, SetPayloadPointsBuilder,
		UpsertPointsBuilder, Value, VectorParamsBuilder, point_id::PointIdOptions, value::Kind,
	},
};

use crate::{
	BoxFuture, Candidate, Error, RecordFilter, RecordMetadata, RecordStore, Result, StoredRecord,
	models::{
		FIELD_ADDRESS, FIELD_ALIAS, FIELD_CATEGORY, FIELD_CITY, FIELD_CREATED_AT, FIELD_FILE_NAME,
		FIELD_NAME, FIELD_PHONE, FIELD_TOWN,
	},
};
use poi_providers::EmbeddingProvider;

const EMBED_BATCH_SIZE: usize = 64;
const SCROLL_PAGE_SIZE: u32 = 256;

/// [`RecordStore`] over one Qdrant collection with cosine distance.
///
/// Texts are embedded through the injected provider before they reach Qdrant. Scores come back as
/// cosine similarity and are reported as `1 - similarity`.
pub struct QdrantRecordStore {
	pub client: Qdrant,
	pub collection: String,
	pub vector_dim: u32,
	embedding: Arc<dyn EmbeddingProvider>,
}
impl QdrantRecordStore {
	pub fn new(cfg: &poi_config::Qdrant, embedding: Arc<dyn EmbeddingProvider>) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim, embedding })
	}

	/// Creates the collection and its payload indexes unless it already exists.
	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(self.collection.clone()).await? {
			return Ok(());
		}

		self.client
			.create_collection(CreateCollectionBuilder::new(&self.collection).vectors_config(
				VectorParamsBuilder::new(u64::from(self.vector_dim), Distance::Cosine),
			))
			.await?;

		for (field, field_type) in [
			(FIELD_NAME, FieldType::Keyword),
			(FIELD_CITY, FieldType::Keyword),
			(FIELD_CATEGORY, FieldType::Keyword),
			(FIELD_CREATED_AT, FieldType::Integer),
		] {
			self.client
				.create_field_index(
					CreateFieldIndexCollectionBuilder::new(&self.collection, field, field_type)
						.wait(true),
				)
				.await?;
		}

		tracing::info!(collection = %self.collection, dim = self.vector_dim, "Created collection.");

		Ok(())
	}

	async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		let mut vectors = Vec::with_capacity(texts.len());

		for chunk in texts.chunks(EMBED_BATCH_SIZE) {
			vectors.extend(self.embedding.embed(chunk).await?);
		}

		if let Some(vec) = vectors.iter().find(|vec| vec.len() != self.vector_dim as usize) {
			return Err(Error::InvalidArgument(format!(
				"embedding dimension {} does not match collection dimension {}.",
				vec.len(),
				self.vector_dim
			)));
		}

		Ok(vectors)
	}

	async fn count_points(&self) -> Result<u64> {
		let response =
			self.client.count(CountPointsBuilder::new(&self.collection).exact(true)).await?;

		Ok(response.result.map(|result| result.count).unwrap_or(0))
	}

	async fn add_points(
		&self,
		identifiers: &[String],
		texts: &[String],
		metadatas: &[RecordMetadata],
	) -> Result<()> {
		if identifiers.len() != texts.len() || identifiers.len() != metadatas.len() {
			return Err(Error::InvalidArgument(format!(
				"batch length mismatch: {} identifiers, {} texts, {} metadatas.",
				identifiers.len(),
				texts.len(),
				metadatas.len()
			)));
		}
		if identifiers.is_empty() {
			return Ok(());
		}

		let vectors = self.embed_batch(texts).await?;
		let mut points = Vec::with_capacity(identifiers.len());

		for ((identifier, vector), metadata) in identifiers.iter().zip(vectors).zip(metadatas) {
			points.push(PointStruct::new(parse_identifier(identifier)?, vector, to_payload(metadata)));
		}

		self.client
			.upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
			.await?;

		Ok(())
	}

	async fn query_points(
		&self,
		text: &str,
		limit: u32,
		filter: &RecordFilter,
	) -> Result<Vec<Candidate>> {
		if filter.is_unsatisfiable() || limit == 0 {
			return Ok(Vec::new());
		}

		let vector = self
			.embed_batch(&[text.to_string()])
			.await?
			.pop()
			.ok_or_else(|| Error::InvalidArgument("embedding provider returned nothing.".into()))?;
		let search = QueryPointsBuilder::new(&self.collection)
			.query(Query::new_nearest(vector))
			.filter(to_qdrant_filter(filter))
			.limit(u64::from(limit))
			.with_payload(true);
		let response = self.client.query(search).await?;
		let mut candidates = Vec::with_capacity(response.result.len());

		for point in response.result {
			let identifier = point_id_to_string(point.id.as_ref());
			let metadata = from_payload(&identifier, &point.payload)?;

			candidates.push(Candidate { identifier, metadata, distance: 1.0 - point.score });
		}

		Ok(candidates)
	}

	async fn scroll_points(&self, filter: &RecordFilter) -> Result<Vec<StoredRecord>> {
		if filter.is_unsatisfiable() {
			return Ok(Vec::new());
		}

		let qdrant_filter = to_qdrant_filter(filter);
		let mut records = Vec::new();
		let mut offset: Option<PointId> = None;

		loop {
			let mut scroll = ScrollPointsBuilder::new(&self.collection)
				.filter(qdrant_filter.clone())
				.limit(SCROLL_PAGE_SIZE)
				.with_payload(true)
				.with_vectors(false);

			if let Some(offset) = offset.take() {
				scroll = scroll.offset(offset);
			}

			let response = self.client.scroll(scroll).await?;

			for point in response.result {
				let identifier = point_id_to_string(point.id.as_ref());
				let metadata = from_payload(&identifier, &point.payload)?;

				records.push(StoredRecord { identifier, metadata });
			}

			match response.next_page_offset {
				Some(next) => offset = Some(next),
				None => break,
			}
		}

		Ok(records)
	}

	async fn overwrite_metadata(&self, identifier: &str, metadata: &RecordMetadata) -> Result<()> {
		let id = parse_identifier(identifier)?;

		self.client
			.overwrite_payload(
				SetPayloadPointsBuilder::new(&self.collection, to_payload(metadata))
					.points_selector(PointsIdsList { ids: vec![PointId::from(id)] })
					.wait(true),
			)
			.await?;

		Ok(())
	}
}
impl RecordStore for QdrantRecordStore {
	fn count(&self) -> BoxFuture<'_, Result<u64>> {
		Box::pin(self.count_points())
	}

	fn add<'a>(
		&'a self,
		identifiers: &'a [String],
		texts: &'a [String],
		metadatas: &'a [RecordMetadata],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.add_points(identifiers, texts, metadatas))
	}

	fn query<'a>(
		&'a self,
		text: &'a str,
		limit: u32,
		filter: &'a RecordFilter,
	) -> BoxFuture<'a, Result<Vec<Candidate>>> {
		Box::pin(self.query_points(text, limit, filter))
	}

	fn get<'a>(&'a self, filter: &'a RecordFilter) -> BoxFuture<'a, Result<Vec<StoredRecord>>> {
		Box::pin(self.scroll_points(filter))
	}

	fn update<'a>(
		&'a self,
		identifier: &'a str,
		metadata: &'a RecordMetadata,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.overwrite_metadata(identifier, metadata))
	}
}

pub fn to_qdrant_filter(filter: &RecordFilter) -> Filter {
	match filter {
		RecordFilter::All(nodes) => Filter::must(nodes.iter().map(to_condition)),
		other => Filter::must([to_condition(other)]),
	}
}

fn to_condition(filter: &RecordFilter) -> Condition {
	match filter {
		RecordFilter::All(nodes) => Condition::from(Filter::must(nodes.iter().map(to_condition))),
		RecordFilter::Eq { field, value } => Condition::matches(field.payload_key(), value.clone()),
		RecordFilter::In { field, values } => {
			Condition::matches(field.payload_key(), values.clone())
		},
		RecordFilter::Range { field, gte, lte } => Condition::range(
			field.payload_key(),
			Range {
				gte: gte.map(|value| value as f64),
				lte: lte.map(|value| value as f64),
				..Default::default()
			},
		),
	}
}

fn parse_identifier(identifier: &str) -> Result<u64> {
	identifier.parse::<u64>().map_err(|_| {
		Error::InvalidArgument(format!("identifier {identifier:?} is not a row ordinal."))
	})
}

fn point_id_to_string(point_id: Option<&PointId>) -> String {
	match point_id.and_then(|id| id.point_id_options.as_ref()) {
		Some(PointIdOptions::Num(num)) => num.to_string(),
		Some(PointIdOptions::Uuid(uuid)) => uuid.clone(),
		None => String::new(),
	}
}

fn to_payload(metadata: &RecordMetadata) -> Payload {
	let mut payload = Payload::new();

	if let Some(file_name) = metadata.file_name.as_ref() {
		payload.insert(FIELD_FILE_NAME, file_name.clone());
	}

	payload.insert(FIELD_NAME, metadata.name.clone());
	payload.insert(FIELD_CATEGORY, metadata.category.clone());
	payload.insert(FIELD_ADDRESS, metadata.address.clone());
	payload.insert(FIELD_PHONE, metadata.phone.clone());
	payload.insert(FIELD_CITY, metadata.city.clone());
	payload.insert(FIELD_TOWN, metadata.town.clone());
	payload.insert(FIELD_CREATED_AT, metadata.created_at);

	if let Some(alias) = metadata.alias.as_ref() {
		payload.insert(FIELD_ALIAS, alias.clone());
	}

	payload
}

fn from_payload(identifier: &str, payload: &HashMap<String, Value>) -> Result<RecordMetadata> {
	let required = |key: &str| {
		payload_string(payload, key).ok_or_else(|| Error::InvalidPayload {
			identifier: identifier.to_string(),
			message: format!("missing string field {key}."),
		})
	};
	let created_at = payload_i64(payload, FIELD_CREATED_AT).ok_or_else(|| Error::InvalidPayload {
		identifier: identifier.to_string(),
		message: format!("missing integer field {FIELD_CREATED_AT}."),
	})?;

	Ok(RecordMetadata {
		file_name: payload_string(payload, FIELD_FILE_NAME),
		name: required(FIELD_NAME)?,
		category: required(FIELD_CATEGORY)?,
		address: payload_string(payload, FIELD_ADDRESS).unwrap_or_default(),
		phone: payload_string(payload, FIELD_PHONE).unwrap_or_default(),
		city: required(FIELD_CITY)?,
		town: payload_string(payload, FIELD_TOWN).unwrap_or_default(),
		created_at,
		alias: payload_string(payload, FIELD_ALIAS),
	})
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	match &payload.get(key)?.kind {
		Some(Kind::StringValue(text)) => Some(text.clone()),
		Some(Kind::IntegerValue(value)) => Some(value.to_string()),
		_ => None,
	}
}

fn payload_i64(payload: &HashMap<String, Value>, key: &str) -> Option<i64> {
	match &payload.get(key)?.kind {
		Some(Kind::IntegerValue(value)) => Some(*value),
		Some(Kind::DoubleValue(value)) if value.fract() == 0.0 => Some(*value as i64),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use qdrant_client::qdrant::{condition::ConditionOneOf, r#match::MatchValue};

	use super::*;
	use crate::MetadataField;

	fn metadata() -> RecordMetadata {
		RecordMetadata {
			file_name: Some("COA_OpenData.csv".to_string()),
			name: "Old Cafe".to_string(),
			category: "Cafe".to_string(),
			address: "1 Road".to_string(),
			phone: "02-0000".to_string(),
			city: "Taipei".to_string(),
			town: "Daan".to_string(),
			created_at: 1_577_836_800,
			alias: Some("New Cafe Name".to_string()),
		}
	}

	#[test]
	fn payload_round_trips_metadata() {
		let payload: HashMap<String, Value> = to_payload(&metadata()).into();
		let parsed = from_payload("0", &payload).expect("payload parses");

		assert_eq!(parsed, metadata());
	}

	#[test]
	fn payload_without_name_is_rejected() {
		let mut payload: HashMap<String, Value> = to_payload(&metadata()).into();

		payload.remove(FIELD_NAME);

		assert!(matches!(from_payload("7", &payload), Err(Error::InvalidPayload { .. })));
	}

	#[test]
	fn conjunction_becomes_must_conditions() {
		let filter = RecordFilter::All(vec![
			RecordFilter::any_of(MetadataField::City, ["Taipei", "Tainan"]),
			RecordFilter::any_of(MetadataField::Category, ["Cafe"]),
			RecordFilter::between(MetadataField::CreatedAt, Some(10), Some(20)),
		]);
		let qdrant = to_qdrant_filter(&filter);

		assert_eq!(qdrant.must.len(), 3);
		assert!(qdrant.should.is_empty());

		let Some(ConditionOneOf::Field(city)) = &qdrant.must[0].condition_one_of else {
			panic!("expected a field condition");
		};

		assert_eq!(city.key, "city");
		assert!(matches!(
			city.r#match.as_ref().and_then(|m| m.match_value.as_ref()),
			Some(MatchValue::Keywords(_))
		));

		let Some(ConditionOneOf::Field(date)) = &qdrant.must[2].condition_one_of else {
			panic!("expected a field condition");
		};
		let range = date.range.as_ref().expect("range condition");

		assert_eq!(date.key, "date");
		assert_eq!(range.gte, Some(10.0));
		assert_eq!(range.lte, Some(20.0));
		assert_eq!(range.gt, None);
	}

	#[test]
	fn identifiers_must_be_row_ordinals() {
		assert_eq!(parse_identifier("42").expect("ordinal"), 42);
		assert!(parse_identifier("abc").is_err());
		assert_eq!(point_id_to_string(Some(&PointId::from(42_u64))), "42");
	}
}
