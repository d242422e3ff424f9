use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

pub const DEFAULT_CANDIDATE_LIMIT: u32 = 10;
pub const DEFAULT_MAX_DISTANCE: f32 = 0.20;
pub const DEFAULT_COLLECTION: &str = "TRAVEL";
pub const DEFAULT_TEXT_COLUMN: &str = "HostWords";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	pub ingest: Ingest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}
impl Default for Service {
	fn default() -> Self {
		Self { log_level: default_log_level() }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Qdrant {
	pub url: String,
	#[serde(default = "default_collection")]
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

/// Wire flavor of the embeddings endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingFlavor {
	/// `POST {api_base}{path}` with a bearer token and the model in the body.
	OpenAi,
	/// `POST {api_base}/openai/deployments/{deployment}/embeddings?api-version={api_version}`
	/// with an `api-key` header.
	Azure,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	#[serde(default = "default_flavor")]
	pub flavor: EmbeddingFlavor,
	pub api_base: String,
	pub api_key: String,
	#[serde(default = "default_embedding_path")]
	pub path: String,
	pub model: String,
	/// Required when `flavor = "azure"`.
	pub deployment: Option<String>,
	/// Required when `flavor = "azure"`.
	pub api_version: Option<String>,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	/// Upper bound on candidates requested from the store per query.
	#[serde(default = "default_candidate_limit")]
	pub candidate_limit: u32,
	/// Inclusive cutoff on the store's distance. Lower distance means more similar, so raising
	/// this admits weaker matches.
	#[serde(default = "default_max_distance")]
	pub max_distance: f32,
}
impl Default for Search {
	fn default() -> Self {
		Self { candidate_limit: DEFAULT_CANDIDATE_LIMIT, max_distance: DEFAULT_MAX_DISTANCE }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ingest {
	pub csv_path: PathBuf,
	/// Column whose text is embedded as the record body.
	#[serde(default = "default_text_column")]
	pub text_column: String,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_collection() -> String {
	DEFAULT_COLLECTION.to_string()
}

fn default_flavor() -> EmbeddingFlavor {
	EmbeddingFlavor::OpenAi
}

fn default_embedding_path() -> String {
	"/embeddings".to_string()
}

fn default_candidate_limit() -> u32 {
	DEFAULT_CANDIDATE_LIMIT
}

fn default_max_distance() -> f32 {
	DEFAULT_MAX_DISTANCE
}

fn default_text_column() -> String {
	DEFAULT_TEXT_COLUMN.to_string()
}
