mod error;
mod scripted;

pub use error::{Error, Result};
pub use scripted::{ScriptedStore, StoreCall};

use std::{
	collections::hash_map::DefaultHasher,
	env,
	hash::{Hash, Hasher},
	sync::atomic::{AtomicU64, Ordering},
	thread,
	time::{Duration, SystemTime, UNIX_EPOCH},
};

use qdrant_client::Qdrant;
use tokio::{runtime::Builder, time};

use poi_providers::{BoxFuture, EmbeddingProvider};

static COLLECTION_SEQ: AtomicU64 = AtomicU64::new(0);

pub fn env_qdrant_url() -> Option<String> {
	env::var("POI_QDRANT_URL").ok()
}

/// A uniquely named collection on a live Qdrant that is deleted when the test ends.
pub struct TestCollection {
	url: String,
	name: String,
	vector_dim: u32,
	cleaned: bool,
}
impl TestCollection {
	pub fn new(url: &str, prefix: &str, vector_dim: u32) -> Self {
		let nanos = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|elapsed| elapsed.as_nanos())
			.unwrap_or_default();
		let seq = COLLECTION_SEQ.fetch_add(1, Ordering::SeqCst);

		Self {
			url: url.to_string(),
			name: format!("{prefix}_{nanos}_{seq}"),
			vector_dim,
			cleaned: false,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn config(&self) -> poi_config::Qdrant {
		poi_config::Qdrant {
			url: self.url.clone(),
			collection: self.name.clone(),
			vector_dim: self.vector_dim,
		}
	}

	pub async fn cleanup(mut self) -> Result<()> {
		delete_collection(&self.url, &self.name).await?;

		self.cleaned = true;

		Ok(())
	}
}
impl Drop for TestCollection {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}

		let url = self.url.clone();
		let name = self.name.clone();
		let cleanup_thread = thread::spawn(move || {
			let runtime = match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) => runtime,
				Err(err) => {
					eprintln!("Test collection cleanup failed: {err}.");

					return;
				},
			};

			if let Err(err) = runtime.block_on(delete_collection(&url, &name)) {
				eprintln!("Test collection cleanup failed: {err}.");
			}
		});
		let _ = cleanup_thread.join();
	}
}

/// Deterministic bag-of-words embedder. Texts sharing tokens land close under cosine distance.
pub struct KeywordEmbedding {
	dim: usize,
}
impl KeywordEmbedding {
	pub fn new(dim: u32) -> Self {
		Self { dim: (dim as usize).max(1) }
	}

	pub fn vector(&self, text: &str) -> Vec<f32> {
		let mut vec = vec![0.0_f32; self.dim];

		for token in text
			.split(|ch: char| !ch.is_alphanumeric())
			.filter(|token| !token.is_empty())
			.map(str::to_lowercase)
		{
			let mut hasher = DefaultHasher::new();

			token.hash(&mut hasher);
			vec[(hasher.finish() % self.dim as u64) as usize] += 1.0;
		}

		let norm = vec.iter().map(|value| value * value).sum::<f32>().sqrt();

		if norm == 0.0 {
			vec[0] = 1.0;
		} else {
			vec.iter_mut().for_each(|value| *value /= norm);
		}

		vec
	}
}
impl EmbeddingProvider for KeywordEmbedding {
	fn embed<'a>(
		&'a self,
		texts: &'a [String],
	) -> BoxFuture<'a, poi_providers::Result<Vec<Vec<f32>>>> {
		let vectors: Vec<Vec<f32>> = texts.iter().map(|text| self.vector(text)).collect();

		Box::pin(async move { Ok(vectors) })
	}
}

async fn delete_collection(url: &str, name: &str) -> Result<()> {
	let client = Qdrant::from_url(url).build()?;
	let exists = time::timeout(Duration::from_secs(10), client.collection_exists(name.to_string()))
		.await
		.map_err(|_| Error::Timeout { operation: "check the collection" })??;

	if !exists {
		return Ok(());
	}

	time::timeout(Duration::from_secs(10), client.delete_collection(name.to_string()))
		.await
		.map_err(|_| Error::Timeout { operation: "delete the collection" })??;

	Ok(())
}
