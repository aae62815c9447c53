use qdrant_client::qdrant::{Query, QueryPointsBuilder, ScoredPoint};

use crate::{Error, Result};

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
	pub vector_name: Option<String>,
}
impl QdrantStore {
	pub fn new(cfg: &shelf_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self {
			client,
			collection: cfg.collection.clone(),
			vector_dim: cfg.vector_dim,
			vector_name: cfg.vector_name.clone(),
		})
	}

	/// Nearest-neighbour query returning at most `limit` points with payloads, most similar first.
	pub async fn nearest(&self, vector: Vec<f32>, limit: u64) -> Result<Vec<ScoredPoint>> {
		if vector.len() != self.vector_dim as usize {
			return Err(Error::InvalidArgument(format!(
				"Query vector has {} dimensions, collection expects {}.",
				vector.len(),
				self.vector_dim
			)));
		}

		let mut search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.with_payload(true)
			.limit(limit);

		if let Some(name) = self.vector_name.as_deref() {
			search = search.using(name);
		}

		let response = self.client.query(search).await?;

		Ok(response.result)
	}
}
