pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Malformed date {value:?} in source row {row}.")]
	MalformedDate { row: usize, value: String },
	#[error("Source is missing required column {column:?}.")]
	MissingColumn { column: String },
	#[error("Failed to read source: {0}")]
	Source(#[from] csv::Error),
	#[error("Record store unavailable: {source}")]
	StoreUnavailable { source: poi_storage::Error },
	#[error("Record store rejected the request: {source}")]
	Store { source: poi_storage::Error },
}
impl From<poi_storage::Error> for Error {
	fn from(err: poi_storage::Error) -> Self {
		match err {
			poi_storage::Error::Qdrant(_) | poi_storage::Error::Embedding(_) =>
				Self::StoreUnavailable { source: err },
			poi_storage::Error::InvalidArgument(_) | poi_storage::Error::InvalidPayload { .. } =>
				Self::Store { source: err },
		}
	}
}
