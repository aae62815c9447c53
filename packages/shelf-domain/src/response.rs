//! Recovery of a structured shortlist from untrusted model text.
//!
//! The chain is ordered and deterministic:
//!
//! 1. Fenced extraction: the `{...}` interior of a (optionally `json`-labeled) fenced block.
//! 2. Brace-span extraction: otherwise the text from the first `{` to the last `}`.
//! 3. Strict decode of the extracted span.
//! 4. Quote-repair decode: single-quoted tokens rewritten to double quotes, decoded once more.
//! 5. Exhaustion: a [`ParseFailure`] carrying the raw text and the reason.
//!
//! Both extractions are lossy heuristics. Unrelated braces in surrounding prose widen the greedy
//! span, and quote repair mangles apostrophes inside values. [`ExtractionMode::Balanced`] swaps the
//! greedy span for a string-aware balanced-brace scan.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::Deserialize;

use crate::product::RerankedItem;

pub use shelf_config::ExtractionMode;

static FENCED_BLOCK: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"(?s)```(?i:json)?\s*(\{.*\})\s*```").ok());
static BRACE_SPAN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").ok());
static SINGLE_QUOTED: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"'(.*?)'").ok());

/// Where the JSON span came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extraction {
	Fenced,
	BraceSpan,
}

/// Which decode attempt produced the result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecoveryStage {
	Strict,
	QuoteRepair,
}
impl RecoveryStage {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Strict => "strict",
			Self::QuoteRepair => "quote_repair",
		}
	}
}

/// Items exactly as the model listed them. Codes are not yet checked against the candidate set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedResponse {
	pub items: Vec<RerankedItem>,
	pub extraction: Extraction,
	pub stage: RecoveryStage,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureReason {
	NoJsonSpan,
	Undecodable { strict: String, repaired: String },
}
impl fmt::Display for FailureReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NoJsonSpan => write!(f, "no JSON object found in the response"),
			Self::Undecodable { strict, repaired } => write!(
				f,
				"strict decode failed ({strict}); quote-repair decode failed ({repaired})"
			),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Model response could not be recovered: {reason}.")]
pub struct ParseFailure {
	pub raw: String,
	pub reason: FailureReason,
}

#[derive(Deserialize)]
struct ModelOutput {
	results: Vec<ModelItem>,
}

#[derive(Deserialize)]
struct ModelItem {
	code: ModelCode,
	name: Option<String>,
	explanation: Option<String>,
}

/// Barcodes are sometimes written as bare JSON numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum ModelCode {
	Text(String),
	Number(u64),
}
impl ModelCode {
	fn into_text(self) -> String {
		match self {
			Self::Text(text) => text,
			Self::Number(number) => number.to_string(),
		}
	}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ResponseParser {
	mode: ExtractionMode,
}
impl ResponseParser {
	pub fn new(mode: ExtractionMode) -> Self {
		Self { mode }
	}

	pub fn mode(&self) -> ExtractionMode {
		self.mode
	}

	pub fn parse(&self, raw: &str) -> Result<ParsedResponse, ParseFailure> {
		let Some((extraction, span)) = self.extract(raw) else {
			tracing::warn!("Model response contains no JSON object.");

			return Err(ParseFailure { raw: raw.to_string(), reason: FailureReason::NoJsonSpan });
		};
		let strict_err = match decode(span) {
			Ok(items) => {
				return Ok(ParsedResponse { items, extraction, stage: RecoveryStage::Strict });
			},
			Err(err) => err,
		};

		tracing::warn!(error = %strict_err, "Model returned malformed JSON. Attempting quote repair.");

		let repaired = repair_quotes(span);

		match decode(&repaired) {
			Ok(items) =>
				Ok(ParsedResponse { items, extraction, stage: RecoveryStage::QuoteRepair }),
			Err(repaired_err) => {
				tracing::warn!(error = %repaired_err, "Quote repair did not recover the response.");

				Err(ParseFailure {
					raw: raw.to_string(),
					reason: FailureReason::Undecodable { strict: strict_err, repaired: repaired_err },
				})
			},
		}
	}

	fn extract<'a>(&self, raw: &'a str) -> Option<(Extraction, &'a str)> {
		if let Some(inner) = fenced_span(raw) {
			let span = match self.mode {
				ExtractionMode::Greedy => Some(inner),
				ExtractionMode::Balanced => balanced_span(inner),
			};

			return span.map(|span| (Extraction::Fenced, span));
		}

		let span = match self.mode {
			ExtractionMode::Greedy => greedy_span(raw),
			ExtractionMode::Balanced => balanced_span(raw),
		};

		span.map(|span| (Extraction::BraceSpan, span))
	}
}

fn fenced_span(raw: &str) -> Option<&str> {
	let re = FENCED_BLOCK.as_ref()?;

	re.captures(raw).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

fn greedy_span(raw: &str) -> Option<&str> {
	let re = BRACE_SPAN.as_ref()?;

	re.find(raw).map(|m| m.as_str())
}

/// Scans from the first `{` to its matching `}`. Quotes of either kind open a string literal in
/// which braces are ignored, so single-quoted payloads stay balanced for quote repair.
fn balanced_span(raw: &str) -> Option<&str> {
	let start = raw.find('{')?;
	let mut depth = 0_usize;
	let mut quote: Option<char> = None;
	let mut escaped = false;

	for (offset, ch) in raw[start..].char_indices() {
		if let Some(open) = quote {
			if escaped {
				escaped = false;
			} else if ch == '\\' {
				escaped = true;
			} else if ch == open {
				quote = None;
			}

			continue;
		}

		match ch {
			'"' | '\'' => quote = Some(ch),
			'{' => depth += 1,
			'}' => {
				depth -= 1;

				if depth == 0 {
					let end = start + offset + ch.len_utf8();

					return Some(&raw[start..end]);
				}
			},
			_ => {},
		}
	}

	None
}

fn repair_quotes(span: &str) -> String {
	match SINGLE_QUOTED.as_ref() {
		Some(re) => re.replace_all(span, "\"${1}\"").into_owned(),
		None => span.to_string(),
	}
}

fn decode(span: &str) -> Result<Vec<RerankedItem>, String> {
	let output: ModelOutput = serde_json::from_str(span).map_err(|err| err.to_string())?;

	Ok(output
		.results
		.into_iter()
		.map(|item| RerankedItem {
			code: item.code.into_text(),
			name: item.name.unwrap_or_default(),
			explanation: item.explanation.unwrap_or_default(),
		})
		.collect())
}
