pub mod embedding;

mod error;

pub use embedding::HttpEmbedding;
pub use error::{Error, Result};

use std::{future::Future, pin::Pin};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};

use poi_config::EmbeddingFlavor;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Turns texts into fixed-length vectors, one per input, in input order.
pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub fn auth_headers(
	flavor: EmbeddingFlavor,
	api_key: &str,
	default_headers: &Map<String, Value>,
) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	match flavor {
		EmbeddingFlavor::OpenAi => {
			headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);
		},
		EmbeddingFlavor::Azure => {
			headers.insert(HeaderName::from_static("api-key"), HeaderValue::from_str(api_key)?);
		},
	}

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: format!("Default header {key} must be a string."),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}
