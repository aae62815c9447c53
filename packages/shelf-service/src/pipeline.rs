//! Retrieve -> prompt -> reason -> parse -> validate.
//!
//! One request is a strictly sequential chain with two suspension points, the index call and the
//! model call. Both race the caller's cancellation token, and the optional deadline bounds the
//! whole run. The pipeline keeps no per-request state, so one instance serves concurrent requests.

use std::{future::Future, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use shelf_config::Config;
use shelf_domain::{
	CandidateProduct, ExtractionMode, ParsedResponse, PromptBuilder, RerankedResult,
	ResponseParser, product,
};

use crate::{
	CandidateRetriever, DEFAULT_TOP_K, Error, QdrantProductIndex, ReasoningClient, Result,
	TextGenerator,
};

pub use shelf_config::UnknownCodePolicy;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
	Idle,
	Retrieving,
	Prompting,
	Reasoning,
	Parsing,
	Validating,
	Done,
	Failed,
}
impl PipelineState {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Idle => "idle",
			Self::Retrieving => "retrieving",
			Self::Prompting => "prompting",
			Self::Reasoning => "reasoning",
			Self::Parsing => "parsing",
			Self::Validating => "validating",
			Self::Done => "done",
			Self::Failed => "failed",
		}
	}
}

#[derive(Clone, Debug)]
pub struct PipelineOptions {
	pub default_top_k: u32,
	pub extraction: ExtractionMode,
	pub unknown_codes: UnknownCodePolicy,
	pub deadline: Option<Duration>,
}
impl PipelineOptions {
	pub fn from_config(cfg: &shelf_config::Search) -> Self {
		Self {
			default_top_k: cfg.top_k,
			extraction: cfg.extraction,
			unknown_codes: cfg.unknown_codes,
			deadline: cfg.deadline_ms.map(Duration::from_millis),
		}
	}
}
impl Default for PipelineOptions {
	fn default() -> Self {
		Self {
			default_top_k: DEFAULT_TOP_K,
			extraction: ExtractionMode::default(),
			unknown_codes: UnknownCodePolicy::default(),
			deadline: None,
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	pub top_k: Option<i64>,
}

/// Outcome of one run together with every state it passed through, terminal state last.
#[derive(Debug)]
pub struct SearchRun {
	pub trace: Vec<PipelineState>,
	pub outcome: Result<RerankedResult>,
}
impl SearchRun {
	pub fn final_state(&self) -> PipelineState {
		if self.outcome.is_ok() { PipelineState::Done } else { PipelineState::Failed }
	}
}

pub struct RerankPipeline {
	retriever: CandidateRetriever,
	prompts: PromptBuilder,
	generator: Arc<dyn TextGenerator>,
	parser: ResponseParser,
	options: PipelineOptions,
}
impl RerankPipeline {
	pub fn new(
		retriever: CandidateRetriever,
		generator: Arc<dyn TextGenerator>,
		options: PipelineOptions,
	) -> Self {
		let parser = ResponseParser::new(options.extraction);

		Self { retriever, prompts: PromptBuilder::new(), generator, parser, options }
	}

	pub fn from_config(cfg: &Config) -> color_eyre::Result<Self> {
		let index = QdrantProductIndex::from_config(cfg)?;
		let generator = ReasoningClient::new(cfg.providers.reasoning.clone());
		let options = PipelineOptions::from_config(&cfg.search);

		Ok(Self::new(CandidateRetriever::new(Arc::new(index)), Arc::new(generator), options))
	}

	pub fn options(&self) -> &PipelineOptions {
		&self.options
	}

	pub async fn search(&self, query: &str, top_k: i64) -> Result<RerankedResult> {
		let request = SearchRequest { query: query.to_string(), top_k: Some(top_k) };

		self.run(&request, &CancellationToken::new()).await.outcome
	}

	pub async fn run(&self, request: &SearchRequest, cancel: &CancellationToken) -> SearchRun {
		let mut trace = Trace::new();
		let outcome = match self.options.deadline {
			Some(limit) => {
				let timed =
					tokio::time::timeout(limit, self.execute(request, cancel, &mut trace)).await;

				timed.unwrap_or_else(|_| Err(Error::Cancelled { stage: trace.current().as_str() }))
			},
			None => self.execute(request, cancel, &mut trace).await,
		};

		match &outcome {
			Ok(result) => {
				trace.enter(PipelineState::Done);

				tracing::info!(results = result.len(), "Product search finished.");
			},
			Err(err) => {
				trace.enter(PipelineState::Failed);

				tracing::warn!(error_code = err.code(), error = %err, "Product search failed.");
			},
		}

		SearchRun { trace: trace.states, outcome }
	}

	async fn execute(
		&self,
		request: &SearchRequest,
		cancel: &CancellationToken,
		trace: &mut Trace,
	) -> Result<RerankedResult> {
		let top_k = request.top_k.unwrap_or(i64::from(self.options.default_top_k));

		trace.enter(PipelineState::Retrieving);
		ensure_active(cancel, PipelineState::Retrieving)?;

		let candidates = suspend(
			cancel,
			PipelineState::Retrieving,
			self.retriever.retrieve(&request.query, top_k),
		)
		.await??;

		if candidates.is_empty() {
			tracing::info!("No candidates recalled. Skipping rerank.");

			return Ok(RerankedResult::empty());
		}

		trace.enter(PipelineState::Prompting);
		ensure_active(cancel, PipelineState::Prompting)?;

		let prompt = self.prompts.build(&request.query, &candidates);

		tracing::debug!(
			candidates = candidates.len(),
			prompt_bytes = prompt.len(),
			"Rendered rerank prompt."
		);

		trace.enter(PipelineState::Reasoning);
		ensure_active(cancel, PipelineState::Reasoning)?;

		let raw = suspend(cancel, PipelineState::Reasoning, self.generator.generate(prompt.as_str()))
			.await?
			.map_err(|err| Error::RerankUnavailable {
				message: format!("Reasoning model call failed: {err:#}"),
			})?;

		trace.enter(PipelineState::Parsing);
		ensure_active(cancel, PipelineState::Parsing)?;

		let parsed = self.parser.parse(&raw).map_err(|failure| {
			tracing::warn!(
				reason = %failure.reason,
				raw_bytes = failure.raw.len(),
				"Discarding unrecoverable model response."
			);
			tracing::debug!(raw = %failure.raw, "Unrecoverable model response.");

			Error::RerankUnavailable { message: failure.to_string() }
		})?;

		trace.enter(PipelineState::Validating);
		ensure_active(cancel, PipelineState::Validating)?;

		self.validate(parsed, &candidates)
	}

	fn validate(
		&self,
		parsed: ParsedResponse,
		candidates: &[CandidateProduct],
	) -> Result<RerankedResult> {
		let unknown: Vec<String> = product::unknown_codes(&parsed.items, candidates)
			.into_iter()
			.map(str::to_string)
			.collect();

		if !unknown.is_empty() {
			match self.options.unknown_codes {
				UnknownCodePolicy::Drop => {
					tracing::warn!(codes = ?unknown, "Dropping product codes outside the candidate set.");
				},
				UnknownCodePolicy::Reject => {
					return Err(Error::RerankUnavailable {
						message: format!(
							"Model returned codes outside the candidate set: {}.",
							unknown.join(", ")
						),
					});
				},
			}
		}

		let returned = parsed.items.len();
		let result = RerankedResult::from_validated(parsed.items, candidates);

		tracing::debug!(
			returned,
			kept = result.len(),
			extraction = ?parsed.extraction,
			stage = parsed.stage.as_str(),
			"Validated rerank results."
		);

		Ok(result)
	}
}

struct Trace {
	states: Vec<PipelineState>,
}
impl Trace {
	fn new() -> Self {
		Self { states: vec![PipelineState::Idle] }
	}

	fn current(&self) -> PipelineState {
		self.states.last().copied().unwrap_or(PipelineState::Idle)
	}

	fn enter(&mut self, state: PipelineState) {
		tracing::debug!(from = self.current().as_str(), to = state.as_str(), "Pipeline transition.");

		self.states.push(state);
	}
}

fn ensure_active(cancel: &CancellationToken, stage: PipelineState) -> Result<()> {
	if cancel.is_cancelled() {
		return Err(Error::Cancelled { stage: stage.as_str() });
	}

	Ok(())
}

async fn suspend<T>(
	cancel: &CancellationToken,
	stage: PipelineState,
	fut: impl Future<Output = T>,
) -> Result<T> {
	tokio::select! {
		biased;
		_ = cancel.cancelled() => Err(Error::Cancelled { stage: stage.as_str() }),
		out = fut => Ok(out),
	}
}
