use std::sync::Arc;

use shelf_domain::CandidateProduct;

use crate::{Error, Result, VectorSearcher};

pub const DEFAULT_TOP_K: u32 = 25;

/// Broad recall against the vector index. Holds no per-request state.
#[derive(Clone)]
pub struct CandidateRetriever {
	index: Arc<dyn VectorSearcher>,
}
impl CandidateRetriever {
	pub fn new(index: Arc<dyn VectorSearcher>) -> Self {
		Self { index }
	}

	/// Returns up to `top_k` candidates in similarity order. An empty set is a valid outcome.
	/// Index failures are not retried.
	pub async fn retrieve(&self, query: &str, top_k: i64) -> Result<Vec<CandidateProduct>> {
		let top_k = validate_top_k(top_k)?;
		let mut candidates = self
			.index
			.search(query, top_k)
			.await
			.map_err(|err| Error::Retrieval { message: format!("{err:#}") })?;

		candidates.truncate(top_k as usize);

		tracing::debug!(top_k, recalled = candidates.len(), "Candidate recall finished.");

		Ok(candidates)
	}
}

pub fn validate_top_k(top_k: i64) -> Result<u32> {
	if top_k <= 0 {
		return Err(Error::InvalidArgument {
			message: format!("top_k must be a positive integer, got {top_k}."),
		});
	}

	u32::try_from(top_k).map_err(|_| Error::InvalidArgument {
		message: format!("top_k must be at most {}, got {top_k}.", u32::MAX),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn top_k_bounds() {
		assert!(matches!(validate_top_k(0), Err(Error::InvalidArgument { .. })));
		assert!(matches!(validate_top_k(-5), Err(Error::InvalidArgument { .. })));
		assert!(matches!(validate_top_k(i64::from(u32::MAX) + 1), Err(Error::InvalidArgument { .. })));
		assert_eq!(validate_top_k(25).expect("valid top_k"), 25);
	}
}
