pub mod pipeline;
pub mod retriever;

mod error;

pub use error::{Error, Result};
pub use pipeline::{
	PipelineOptions, PipelineState, RerankPipeline, SearchRequest, SearchRun, UnknownCodePolicy,
};
pub use retriever::{CandidateRetriever, DEFAULT_TOP_K};
pub use shelf_domain::{CandidateProduct, RerankedItem, RerankedResult};
pub use tokio_util::sync::CancellationToken;

use std::{future::Future, pin::Pin};

use color_eyre::eyre;

use shelf_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use shelf_providers::{embedding, generator};
use shelf_storage::{products, qdrant::QdrantStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Vector index over the product table: embeds the query and returns the nearest records, most
/// similar first.
pub trait VectorSearcher
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		query: &'a str,
		top_k: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<CandidateProduct>>>;
}

/// Generative model answering one prompt with free text.
pub trait TextGenerator
where
	Self: Send + Sync,
{
	fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, color_eyre::Result<String>>;
}

pub struct QdrantProductIndex {
	embedding: EmbeddingProviderConfig,
	store: QdrantStore,
}
impl QdrantProductIndex {
	pub fn new(embedding: EmbeddingProviderConfig, store: QdrantStore) -> Self {
		Self { embedding, store }
	}

	pub fn from_config(cfg: &Config) -> color_eyre::Result<Self> {
		let store = QdrantStore::new(&cfg.storage.qdrant)?;

		Ok(Self::new(cfg.providers.embedding.clone(), store))
	}

	async fn nearest_products(
		&self,
		query: &str,
		top_k: u32,
	) -> color_eyre::Result<Vec<CandidateProduct>> {
		let embeddings = embedding::embed(&self.embedding, std::slice::from_ref(&query.to_string()))
			.await?;
		let query_vec = embeddings
			.into_iter()
			.next()
			.ok_or_else(|| eyre::eyre!("Embedding provider returned no vectors."))?;

		if query_vec.len() != self.store.vector_dim as usize {
			return Err(eyre::eyre!("Embedding vector dimension mismatch."));
		}

		let points = self.store.nearest(query_vec, u64::from(top_k)).await?;

		Ok(products::collect_candidates(&points))
	}
}
impl VectorSearcher for QdrantProductIndex {
	fn search<'a>(
		&'a self,
		query: &'a str,
		top_k: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<CandidateProduct>>> {
		Box::pin(self.nearest_products(query, top_k))
	}
}

pub struct ReasoningClient {
	cfg: LlmProviderConfig,
}
impl ReasoningClient {
	pub fn new(cfg: LlmProviderConfig) -> Self {
		Self { cfg }
	}
}
impl TextGenerator for ReasoningClient {
	fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(async move { Ok(generator::generate(&self.cfg, prompt).await?) })
	}
}
