//! Rendering of the rerank prompt.
//!
//! The builder places no limit on the number of candidates. The practical ceiling is the context
//! window of the configured reasoning model: with summaries of a few hundred characters, the
//! default candidate-set size of 25 stays well below 16k tokens.

use std::fmt;

use serde::Serialize;

use crate::product::{CandidateProduct, MAX_RESULTS};

const SYSTEM_ROLE: &str = "You are an expert shopping assistant. \
You receive a shopper's request and a list of candidate products retrieved by a similarity search.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt(String);
impl Prompt {
	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn into_string(self) -> String {
		self.0
	}
}
impl fmt::Display for Prompt {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

#[derive(Serialize)]
struct PromptCandidate<'a> {
	code: &'a str,
	name: &'a str,
	summary: &'a str,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PromptBuilder;
impl PromptBuilder {
	pub fn new() -> Self {
		Self
	}

	pub fn build(&self, query: &str, candidates: &[CandidateProduct]) -> Prompt {
		let listed: Vec<PromptCandidate<'_>> = candidates
			.iter()
			.map(|candidate| PromptCandidate {
				code: &candidate.code,
				name: &candidate.name,
				summary: &candidate.summary,
			})
			.collect();
		let candidates_json =
			serde_json::to_string_pretty(&listed).unwrap_or_else(|_| "[]".to_string());
		let schema = serde_json::json!({
			"results": [
				{ "code": "CODE", "name": "PRODUCT_NAME", "explanation": "One sentence." }
			]
		});
		let query_json = serde_json::to_string(query).unwrap_or_else(|_| "\"\"".to_string());

		Prompt(format!(
			"{SYSTEM_ROLE}\n\n\
User request: {query_json}\n\n\
Candidates:\n{candidates_json}\n\n\
Instructions:\n\
1. If the request uses generic wellness or quality terms (for example \"healthy\", \"good\", \"nutritious\"), \
judge each product from its summary: ingredients, additives, nutriments, Nutri-Score grade, and Nova group. \
Never rely on the product name alone.\n\
2. Keep ONLY candidates that satisfy every explicit constraint in the request, including negations \
(\"no sugar\", \"without palm oil\"), quantities (\"at least 10g protein\"), and ingredient exclusions.\n\
3. Rank the remaining candidates by relevance to the request, most relevant first.\n\
4. Return at most {MAX_RESULTS} products. For each, give its code and name exactly as listed and a \
one-sentence explanation that cites the summary data you used.\n\
Only use codes that appear in the candidate list. If no candidate qualifies, return an empty results list.\n\n\
Output format: a single JSON object and nothing else, matching this schema:\n{schema}"
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn escapes_query_quotes() {
		let prompt = PromptBuilder::new().build("say \"hi\"", &[]);

		assert!(prompt.as_str().contains(r#"User request: "say \"hi\"""#));
		assert!(prompt.as_str().contains("Candidates:\n[]"));
	}
}
