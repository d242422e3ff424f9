use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{BoxFuture, EmbeddingProvider, Error, Result};
use poi_config::{EmbeddingFlavor, EmbeddingProviderConfig};

/// Embedding client for OpenAI-compatible and Azure OpenAI endpoints.
pub struct HttpEmbedding {
	cfg: EmbeddingProviderConfig,
	client: Client,
}
impl HttpEmbedding {
	pub fn new(cfg: EmbeddingProviderConfig) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		endpoint_url(&cfg)?;

		Ok(Self { cfg, client })
	}

	pub fn config(&self) -> &EmbeddingProviderConfig {
		&self.cfg
	}

	async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		if texts.is_empty() {
			return Ok(Vec::new());
		}

		let url = endpoint_url(&self.cfg)?;
		let body = request_body(&self.cfg, texts);
		let res = self
			.client
			.post(url)
			.headers(crate::auth_headers(
				self.cfg.flavor,
				&self.cfg.api_key,
				&self.cfg.default_headers,
			)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;
		let vectors = parse_embedding_response(json)?;

		if vectors.len() != texts.len() {
			return Err(Error::InvalidResponse {
				message: format!("expected {} embeddings, got {}.", texts.len(), vectors.len()),
			});
		}
		if let Some(vec) = vectors.iter().find(|vec| vec.len() != self.cfg.dimensions as usize) {
			return Err(Error::InvalidResponse {
				message: format!(
					"embedding dimension {} does not match configured {}.",
					vec.len(),
					self.cfg.dimensions
				),
			});
		}

		tracing::debug!(
			provider_id = %self.cfg.provider_id,
			count = vectors.len(),
			"Embedded texts."
		);

		Ok(vectors)
	}
}
impl EmbeddingProvider for HttpEmbedding {
	fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(self.embed_texts(texts))
	}
}

pub fn endpoint_url(cfg: &EmbeddingProviderConfig) -> Result<String> {
	match cfg.flavor {
		EmbeddingFlavor::OpenAi => Ok(format!("{}{}", cfg.api_base, cfg.path)),
		EmbeddingFlavor::Azure => {
			let deployment = cfg.deployment.as_deref().ok_or_else(|| Error::InvalidConfig {
				message: "azure flavor requires a deployment.".to_string(),
			})?;
			let api_version = cfg.api_version.as_deref().ok_or_else(|| Error::InvalidConfig {
				message: "azure flavor requires an api_version.".to_string(),
			})?;

			Ok(format!(
				"{}/openai/deployments/{deployment}/embeddings?api-version={api_version}",
				cfg.api_base
			))
		},
	}
}

// Azure routes the model through the deployment, and ada-002 deployments reject `dimensions`.
fn request_body(cfg: &EmbeddingProviderConfig, texts: &[String]) -> Value {
	match cfg.flavor {
		EmbeddingFlavor::OpenAi => serde_json::json!({
			"model": cfg.model,
			"input": texts,
			"dimensions": cfg.dimensions,
		}),
		EmbeddingFlavor::Azure => serde_json::json!({ "input": texts }),
	}
}

fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let data = json.get("data").and_then(|v| v.as_array()).ok_or_else(|| Error::InvalidResponse {
		message: "missing data array.".to_string(),
	})?;
	let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());

	for (fallback_index, item) in data.iter().enumerate() {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.map(|v| v as usize)
			.unwrap_or(fallback_index);
		let embedding =
			item.get("embedding").and_then(|v| v.as_array()).ok_or_else(|| {
				Error::InvalidResponse { message: "item missing embedding array.".to_string() }
			})?;
		let mut vec = Vec::with_capacity(embedding.len());

		for value in embedding {
			let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
				message: "embedding value must be numeric.".to_string(),
			})?;

			vec.push(number as f32);
		}

		indexed.push((index, vec));
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}

#[cfg(test)]
mod tests {
	use serde_json::Map;

	use super::*;

	fn cfg(flavor: EmbeddingFlavor) -> EmbeddingProviderConfig {
		EmbeddingProviderConfig {
			provider_id: "test".to_string(),
			flavor,
			api_base: "https://example.test".to_string(),
			api_key: "key".to_string(),
			path: "/v1/embeddings".to_string(),
			model: "text-embedding-3-small".to_string(),
			deployment: Some("ada".to_string()),
			api_version: Some("2024-02-01".to_string()),
			dimensions: 2,
			timeout_ms: 1_000,
			default_headers: Map::new(),
		}
	}

	#[test]
	fn parses_embeddings_in_index_order() {
		let json = serde_json::json!({
			"data": [
				{ "index": 1, "embedding": [2.0, 3.0] },
				{ "index": 0, "embedding": [0.5, 1.5] }
			]
		});
		let parsed = parse_embedding_response(json).expect("parse failed");

		assert_eq!(parsed, vec![vec![0.5, 1.5], vec![2.0, 3.0]]);
	}

	#[test]
	fn rejects_non_numeric_values() {
		let json = serde_json::json!({ "data": [{ "index": 0, "embedding": ["x"] }] });

		assert!(matches!(parse_embedding_response(json), Err(Error::InvalidResponse { .. })));
	}

	#[test]
	fn openai_url_joins_base_and_path() {
		let url = endpoint_url(&cfg(EmbeddingFlavor::OpenAi)).expect("url");

		assert_eq!(url, "https://example.test/v1/embeddings");
	}

	#[test]
	fn azure_url_routes_through_deployment() {
		let url = endpoint_url(&cfg(EmbeddingFlavor::Azure)).expect("url");

		assert_eq!(
			url,
			"https://example.test/openai/deployments/ada/embeddings?api-version=2024-02-01"
		);
	}

	#[test]
	fn azure_body_omits_model_and_dimensions() {
		let texts = vec!["tea house".to_string()];
		let body = request_body(&cfg(EmbeddingFlavor::Azure), &texts);

		assert!(body.get("model").is_none());
		assert!(body.get("dimensions").is_none());
		assert_eq!(body["input"][0], "tea house");
	}

	#[tokio::test]
	async fn empty_input_skips_the_request() {
		let provider = HttpEmbedding::new(cfg(EmbeddingFlavor::OpenAi)).expect("provider");
		let vectors = provider.embed(&[]).await.expect("embed");

		assert!(vectors.is_empty());
	}
}
