pub mod dates;
pub mod ingest;
pub mod rename;
pub mod search;
pub mod source;
pub mod time_serde;

mod error;

pub use error::{Error, Result};
pub use ingest::LoadReport;
pub use rename::{RenameOutcome, RenameRequest};
pub use search::SearchRequest;
pub use source::RawRow;

use std::sync::Arc;

use poi_config::Config;
use poi_storage::{Candidate, RecordStore};

/// Entry points over one injected [`RecordStore`].
///
/// The store handle is created once at startup and shared for the process lifetime.
#[derive(Clone)]
pub struct PoiService {
	pub search: poi_config::Search,
	pub store: Arc<dyn RecordStore>,
}
impl PoiService {
	pub fn new(search: poi_config::Search, store: Arc<dyn RecordStore>) -> Self {
		Self { search, store }
	}

	pub fn from_config(cfg: &Config, store: Arc<dyn RecordStore>) -> Self {
		Self::new(cfg.search.clone(), store)
	}

	/// Keeps candidates at or under the configured distance, in the order the store ranked them.
	pub(crate) fn retain_within(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
		let max_distance = self.search.max_distance;

		candidates.into_iter().filter(|candidate| candidate.distance <= max_distance).collect()
	}
}
