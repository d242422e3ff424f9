use reqwest::header::AUTHORIZATION;
use serde_json::{Map, Value};

use poi_config::EmbeddingFlavor;

#[test]
fn openai_flavor_uses_bearer_auth() {
	let headers = poi_providers::auth_headers(EmbeddingFlavor::OpenAi, "secret", &Map::new())
		.expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
	assert!(headers.get("api-key").is_none());
}

#[test]
fn azure_flavor_uses_api_key_header() {
	let headers = poi_providers::auth_headers(EmbeddingFlavor::Azure, "secret", &Map::new())
		.expect("Failed to build headers.");

	assert_eq!(headers.get("api-key").expect("Missing api-key header."), "secret");
	assert!(headers.get(AUTHORIZATION).is_none());
}

#[test]
fn default_headers_are_forwarded() {
	let mut extra = Map::new();

	extra.insert("x-tenant".to_string(), Value::String("travel".to_string()));

	let headers = poi_providers::auth_headers(EmbeddingFlavor::OpenAi, "secret", &extra)
		.expect("Failed to build headers.");

	assert_eq!(headers.get("x-tenant").expect("Missing forwarded header."), "travel");
}

#[test]
fn non_string_default_header_is_rejected() {
	let mut extra = Map::new();

	extra.insert("x-retries".to_string(), Value::from(3));

	let err = poi_providers::auth_headers(EmbeddingFlavor::OpenAi, "secret", &extra)
		.expect_err("Numeric header value must be rejected.");

	assert!(matches!(err, poi_providers::Error::InvalidConfig { .. }));
}
