use std::collections::{HashMap, HashSet};

use qdrant_client::qdrant::{ScoredPoint, Value, value::Kind};

use shelf_domain::CandidateProduct;

/// Payload key of the product identifier.
pub const CODE_KEY: &str = "code";
/// Payload keys tried, in order, for the display name.
pub const NAME_KEYS: [&str; 2] = ["name", "product_name"];
pub const SUMMARY_KEY: &str = "summary";

/// Converts ranked points into candidates, keeping rank order. Points without a code are skipped
/// and repeated codes keep their first, most similar, occurrence.
pub fn collect_candidates(points: &[ScoredPoint]) -> Vec<CandidateProduct> {
	let mut out = Vec::with_capacity(points.len());
	let mut seen = HashSet::new();

	for (rank, point) in points.iter().enumerate() {
		let Some(candidate) = candidate_from_payload(&point.payload) else {
			tracing::warn!(rank, "Product point missing code.");

			continue;
		};

		if !seen.insert(candidate.code.clone()) {
			tracing::warn!(code = %candidate.code, rank, "Duplicate product code in recall.");

			continue;
		}

		out.push(candidate);
	}

	out
}

pub fn candidate_from_payload(payload: &HashMap<String, Value>) -> Option<CandidateProduct> {
	let code = payload_string(payload, CODE_KEY).filter(|code| !code.trim().is_empty())?;
	let name =
		NAME_KEYS.iter().find_map(|key| payload_string(payload, key)).unwrap_or_default();
	let summary = payload_string(payload, SUMMARY_KEY).unwrap_or_default();

	Some(CandidateProduct { code, name, summary })
}

/// Reads a string payload field. Integer codes are rendered as decimal text.
pub fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.to_string()),
		Some(Kind::IntegerValue(number)) => Some(number.to_string()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn text(value: &str) -> Value {
		Value { kind: Some(Kind::StringValue(value.to_string())) }
	}

	fn point(fields: &[(&str, Value)], score: f32) -> ScoredPoint {
		let payload = fields.iter().map(|(key, value)| (key.to_string(), value.clone())).collect();

		ScoredPoint { payload, score, ..Default::default() }
	}

	#[test]
	fn reads_legacy_product_name_field() {
		let points = vec![point(
			&[
				("code", text("737628064502")),
				("product_name", text("Rice noodles")),
				("summary", text("It has a Nova group classification of 1.")),
			],
			0.9,
		)];
		let candidates = collect_candidates(&points);

		assert_eq!(candidates.len(), 1);
		assert_eq!(candidates[0].name, "Rice noodles");
		assert_eq!(candidates[0].summary, "It has a Nova group classification of 1.");
	}

	#[test]
	fn skips_points_without_code_and_duplicates() {
		let points = vec![
			point(&[("code", text("A")), ("name", text("First"))], 0.9),
			point(&[("name", text("No code"))], 0.8),
			point(&[("code", text("A")), ("name", text("Again"))], 0.7),
			point(&[("code", Value { kind: Some(Kind::IntegerValue(42)) })], 0.6),
		];
		let candidates = collect_candidates(&points);
		let codes: Vec<&str> = candidates.iter().map(|c| c.code.as_str()).collect();

		assert_eq!(codes, vec!["A", "42"]);
		assert_eq!(candidates[0].name, "First");
		assert_eq!(candidates[1].summary, "");
	}
}
