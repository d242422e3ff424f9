pub mod filter;
pub mod models;
pub mod qdrant;

mod error;

pub use error::Error;
pub use filter::{MetadataField, RecordFilter};
pub use models::{Candidate, RecordMetadata, StoredRecord};
pub use poi_providers::BoxFuture;
pub use qdrant::QdrantRecordStore;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The external store that holds records, their embeddings, and their metadata.
///
/// Implementations own embedding of texts, so callers only ever deal in text and metadata.
pub trait RecordStore
where
	Self: Send + Sync,
{
	/// Number of records currently stored.
	fn count(&self) -> BoxFuture<'_, Result<u64>>;

	/// Inserts one batch. The three slices are parallel and must have equal length.
	fn add<'a>(
		&'a self,
		identifiers: &'a [String],
		texts: &'a [String],
		metadatas: &'a [RecordMetadata],
	) -> BoxFuture<'a, Result<()>>;

	/// Nearest neighbours of `text` among records matching `filter`, ascending by distance.
	fn query<'a>(
		&'a self,
		text: &'a str,
		limit: u32,
		filter: &'a RecordFilter,
	) -> BoxFuture<'a, Result<Vec<Candidate>>>;

	/// Every record matching `filter`, in the store's stable lookup order.
	fn get<'a>(&'a self, filter: &'a RecordFilter) -> BoxFuture<'a, Result<Vec<StoredRecord>>>;

	/// Replaces the full metadata of one record.
	fn update<'a>(
		&'a self,
		identifier: &'a str,
		metadata: &'a RecordMetadata,
	) -> BoxFuture<'a, Result<()>>;
}
