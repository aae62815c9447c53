use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
	/// Optional. Name of the dense vector when the collection uses named vectors.
	pub vector_name: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub reasoning: LlmProviderConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	/// Candidate-set size used when a request does not carry its own.
	pub top_k: u32,
	pub extraction: ExtractionMode,
	pub unknown_codes: UnknownCodePolicy,
	/// Optional. Requests still running after this many milliseconds are cancelled.
	pub deadline_ms: Option<u64>,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			top_k: 25,
			extraction: ExtractionMode::default(),
			unknown_codes: UnknownCodePolicy::default(),
			deadline_ms: None,
		}
	}
}

/// How the JSON span is cut out of a model reply. Parsed case-insensitively.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum ExtractionMode {
	/// First `{` to last `}`.
	#[default]
	Greedy,
	/// First `{` to its matching `}`, ignoring braces inside string literals.
	Balanced,
}
impl ExtractionMode {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Greedy => "greedy",
			Self::Balanced => "balanced",
		}
	}
}
impl FromStr for ExtractionMode {
	type Err = String;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value.trim().to_ascii_lowercase().as_str() {
			"greedy" => Ok(Self::Greedy),
			"balanced" => Ok(Self::Balanced),
			other => Err(format!(
				"search.extraction must be one of greedy or balanced, got {other:?}."
			)),
		}
	}
}
impl TryFrom<String> for ExtractionMode {
	type Error = String;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

/// What to do with result codes that were never offered to the model. Parsed case-insensitively.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum UnknownCodePolicy {
	#[default]
	Drop,
	Reject,
}
impl UnknownCodePolicy {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Drop => "drop",
			Self::Reject => "reject",
		}
	}
}
impl FromStr for UnknownCodePolicy {
	type Err = String;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value.trim().to_ascii_lowercase().as_str() {
			"drop" => Ok(Self::Drop),
			"reject" => Ok(Self::Reject),
			other =>
				Err(format!("search.unknown_codes must be one of drop or reject, got {other:?}.")),
		}
	}
}
impl TryFrom<String> for UnknownCodePolicy {
	type Error = String;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}
