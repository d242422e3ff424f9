mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, DEFAULT_CANDIDATE_LIMIT, DEFAULT_COLLECTION, DEFAULT_MAX_DISTANCE,
	DEFAULT_TEXT_COLUMN, EmbeddingFlavor, EmbeddingProviderConfig, Ingest, Providers, Qdrant,
	Search, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } => Error::ParseConfig { path: path.to_path_buf(), source },
		other => other,
	})
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.storage.qdrant.url.trim().is_empty() {
		return Err(invalid("storage.qdrant.url", "must be non-empty."));
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(invalid("storage.qdrant.collection", "must be non-empty."));
	}

	let embedding = &cfg.providers.embedding;

	if embedding.dimensions == 0 {
		return Err(invalid("providers.embedding.dimensions", "must be greater than zero."));
	}
	if embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(invalid(
			"providers.embedding.dimensions",
			"must match storage.qdrant.vector_dim.",
		));
	}
	if embedding.api_key.trim().is_empty() {
		return Err(invalid("providers.embedding.api_key", "must be non-empty."));
	}
	if embedding.api_base.trim().is_empty() {
		return Err(invalid("providers.embedding.api_base", "must be non-empty."));
	}
	if embedding.timeout_ms == 0 {
		return Err(invalid("providers.embedding.timeout_ms", "must be greater than zero."));
	}
	if embedding.flavor == EmbeddingFlavor::Azure {
		if embedding.deployment.is_none() {
			return Err(invalid(
				"providers.embedding.deployment",
				"is required when flavor is azure.",
			));
		}
		if embedding.api_version.is_none() {
			return Err(invalid(
				"providers.embedding.api_version",
				"is required when flavor is azure.",
			));
		}
	}
	if cfg.search.candidate_limit == 0 {
		return Err(invalid("search.candidate_limit", "must be greater than zero."));
	}
	if !cfg.search.max_distance.is_finite() {
		return Err(invalid("search.max_distance", "must be a finite number."));
	}
	if cfg.search.max_distance < 0.0 {
		return Err(invalid("search.max_distance", "must be zero or greater."));
	}
	if cfg.ingest.text_column.trim().is_empty() {
		return Err(invalid("ingest.text_column", "must be non-empty."));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let embedding = &mut cfg.providers.embedding;

	embedding.api_base = embedding.api_base.trim_end_matches('/').to_string();

	if embedding.deployment.as_deref().map(|value| value.trim().is_empty()).unwrap_or(false) {
		embedding.deployment = None;
	}
	if embedding.api_version.as_deref().map(|value| value.trim().is_empty()).unwrap_or(false) {
		embedding.api_version = None;
	}

	cfg.ingest.text_column = cfg.ingest.text_column.trim().to_string();
}

fn invalid(field: &'static str, message: &str) -> Error {
	Error::Validation { field, message: message.to_string() }
}
