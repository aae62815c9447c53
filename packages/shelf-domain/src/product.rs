use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Upper bound on the number of items in a final shortlist.
pub const MAX_RESULTS: usize = 5;

/// A product record returned by the vector index for one request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProduct {
	pub code: String,
	pub name: String,
	#[serde(default)]
	pub summary: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerankedItem {
	pub code: String,
	pub name: String,
	pub explanation: String,
}

/// Final shortlist, highest relevance first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerankedResult {
	pub results: Vec<RerankedItem>,
}
impl RerankedResult {
	pub fn empty() -> Self {
		Self::default()
	}

	/// Keeps items whose code belongs to `candidates`, first occurrence wins, capped at
	/// [`MAX_RESULTS`].
	pub fn from_validated(items: Vec<RerankedItem>, candidates: &[CandidateProduct]) -> Self {
		let known = candidate_codes(candidates);
		let mut seen = HashSet::new();
		let results = items
			.into_iter()
			.filter(|item| known.contains(item.code.as_str()))
			.filter(|item| seen.insert(item.code.clone()))
			.take(MAX_RESULTS)
			.collect();

		Self { results }
	}

	pub fn len(&self) -> usize {
		self.results.len()
	}

	pub fn is_empty(&self) -> bool {
		self.results.is_empty()
	}
}

pub fn candidate_codes(candidates: &[CandidateProduct]) -> HashSet<&str> {
	candidates.iter().map(|candidate| candidate.code.as_str()).collect()
}

/// Codes in `items` that do not belong to `candidates`, in model order.
pub fn unknown_codes<'a>(items: &'a [RerankedItem], candidates: &[CandidateProduct]) -> Vec<&'a str> {
	let known = candidate_codes(candidates);

	items
		.iter()
		.map(|item| item.code.as_str())
		.filter(|code| !known.contains(code))
		.collect()
}
