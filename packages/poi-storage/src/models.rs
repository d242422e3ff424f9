pub const FIELD_FILE_NAME: &str = "file_name";
pub const FIELD_NAME: &str = "name";
pub const FIELD_CATEGORY: &str = "type";
pub const FIELD_ADDRESS: &str = "address";
pub const FIELD_PHONE: &str = "tel";
pub const FIELD_CITY: &str = "city";
pub const FIELD_TOWN: &str = "town";
pub const FIELD_CREATED_AT: &str = "date";
pub const FIELD_ALIAS: &str = "new_store_name";

/// Structured metadata of one point of interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMetadata {
	pub file_name: Option<String>,
	pub name: String,
	pub category: String,
	pub address: String,
	pub phone: String,
	pub city: String,
	pub town: String,
	/// Epoch seconds.
	pub created_at: i64,
	/// Display override set by a rename. Never filtered on.
	pub alias: Option<String>,
}
impl RecordMetadata {
	/// The alias when one has been set, otherwise the original name.
	pub fn display_name(&self) -> &str {
		self.alias.as_deref().unwrap_or(&self.name)
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
	pub identifier: String,
	pub metadata: RecordMetadata,
}

/// One nearest-neighbour hit. Lower distance means more similar.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
	pub identifier: String,
	pub metadata: RecordMetadata,
	pub distance: f32,
}
