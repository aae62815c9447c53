use std::sync::Arc;

use shelf_service::{CancellationToken, RerankPipeline};

#[derive(Clone)]
pub struct AppState {
	pub pipeline: Arc<RerankPipeline>,
	/// Parent of every per-request token. Cancelled on shutdown.
	pub shutdown: CancellationToken,
}
impl AppState {
	pub fn new(config: &shelf_config::Config) -> color_eyre::Result<Self> {
		let pipeline = RerankPipeline::from_config(config)?;

		Ok(Self::from_pipeline(pipeline))
	}

	pub fn from_pipeline(pipeline: RerankPipeline) -> Self {
		Self { pipeline: Arc::new(pipeline), shutdown: CancellationToken::new() }
	}
}
