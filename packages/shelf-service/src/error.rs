pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid argument: {message}")]
	InvalidArgument { message: String },
	#[error("Retrieval failed: {message}")]
	Retrieval { message: String },
	#[error("Rerank unavailable: {message}")]
	RerankUnavailable { message: String },
	#[error("Search cancelled while {stage}.")]
	Cancelled { stage: &'static str },
}
impl Error {
	/// Stable machine-readable code for boundary responses.
	pub fn code(&self) -> &'static str {
		match self {
			Self::InvalidArgument { .. } => "invalid_argument",
			Self::Retrieval { .. } => "retrieval_error",
			Self::RerankUnavailable { .. } => "rerank_unavailable",
			Self::Cancelled { .. } => "cancelled",
		}
	}
}
