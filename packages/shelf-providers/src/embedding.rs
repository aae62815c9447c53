use serde::Deserialize;
use serde_json::Value;

use crate::{Error, Result};

#[derive(Deserialize)]
struct EmbeddingResponse {
	data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
	index: Option<usize>,
	embedding: Vec<f32>,
}

/// Embeds `texts` with an OpenAI-compatible embeddings endpoint. Output order follows input order.
pub async fn embed(
	cfg: &shelf_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	let client = crate::http_client(cfg.timeout_ms)?;
	let url = crate::endpoint(&cfg.api_base, &cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});

	tracing::debug!(provider = %cfg.provider_id, model = %cfg.model, inputs = texts.len(), "Requesting embeddings.");

	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	vectors_in_input_order(json, texts.len())
}

/// Rows may arrive out of order; `index` wins over position when present.
fn vectors_in_input_order(json: Value, expected: usize) -> Result<Vec<Vec<f32>>> {
	let response: EmbeddingResponse = serde_json::from_value(json).map_err(|err| {
		Error::invalid_response(format!("Embedding response has an unexpected shape: {err}."))
	})?;

	if response.data.len() != expected {
		return Err(Error::invalid_response(format!(
			"Embedding response returned {} vectors for {expected} inputs.",
			response.data.len()
		)));
	}

	let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];

	for (position, row) in response.data.into_iter().enumerate() {
		let slot = row.index.unwrap_or(position);
		let Some(entry) = slots.get_mut(slot) else {
			return Err(Error::invalid_response(format!("Embedding index {slot} is out of range.")));
		};

		if entry.is_some() {
			return Err(Error::invalid_response(format!(
				"Embedding index {slot} appears more than once."
			)));
		}

		*entry = Some(row.embedding);
	}

	Ok(slots.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn orders_vectors_by_index() {
		let json = serde_json::json!({
			"data": [
				{ "index": 1, "embedding": [2.0, 3.0] },
				{ "index": 0, "embedding": [0.5, 1.5] }
			]
		});
		let vectors = vectors_in_input_order(json, 2).expect("parse failed");

		assert_eq!(vectors, vec![vec![0.5, 1.5], vec![2.0, 3.0]]);
	}

	#[test]
	fn falls_back_to_position_without_index() {
		let json = serde_json::json!({ "data": [{ "embedding": [1.0] }, { "embedding": [2.0] }] });
		let vectors = vectors_in_input_order(json, 2).expect("parse failed");

		assert_eq!(vectors, vec![vec![1.0], vec![2.0]]);
	}

	#[test]
	fn rejects_malformed_rows() {
		let json = serde_json::json!({ "data": [{ "embedding": ["x"] }] });

		assert!(matches!(
			vectors_in_input_order(json, 1),
			Err(Error::InvalidResponse { .. })
		));
	}

	#[test]
	fn rejects_count_mismatch_and_repeated_index() {
		let short = serde_json::json!({ "data": [{ "embedding": [1.0] }] });
		let repeated = serde_json::json!({
			"data": [{ "index": 0, "embedding": [1.0] }, { "index": 0, "embedding": [2.0] }]
		});
		let err = vectors_in_input_order(short, 2).expect_err("Expected count mismatch.");

		assert_eq!(err.to_string(), "Embedding response returned 1 vectors for 2 inputs.");
		assert!(vectors_in_input_order(repeated, 2).is_err());
	}
}
