pub mod product;
pub mod prompt;
pub mod response;

pub use product::{CandidateProduct, MAX_RESULTS, RerankedItem, RerankedResult};
pub use prompt::{Prompt, PromptBuilder};
pub use response::{
	Extraction, ExtractionMode, FailureReason, ParseFailure, ParsedResponse, RecoveryStage,
	ResponseParser,
};
