use serde_json::Value;

use crate::{Error, Result};

/// Single-shot completion against an OpenAI-compatible chat endpoint. The prompt is sent as one
/// user message and the first choice's text is returned untouched.
pub async fn generate(cfg: &shelf_config::LlmProviderConfig, prompt: &str) -> Result<String> {
	let client = crate::http_client(cfg.timeout_ms)?;
	let url = crate::endpoint(&cfg.api_base, &cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": [
			{ "role": "user", "content": prompt }
		],
	});

	tracing::debug!(provider = %cfg.provider_id, model = %cfg.model, prompt_bytes = prompt.len(), "Requesting completion.");

	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion_text(&json)
}

fn parse_completion_text(json: &Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.ok_or_else(|| Error::invalid_response("Completion response is missing message content."))?;

	if let Some(text) = content.as_str() {
		return Ok(text.to_string());
	}

	// Some gateways return content as a list of typed parts.
	if let Some(parts) = content.as_array() {
		let text: String = parts
			.iter()
			.filter_map(|part| part.get("text").and_then(|t| t.as_str()))
			.collect();

		return Ok(text);
	}

	Err(Error::invalid_response("Completion content must be text."))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn returns_choice_content_verbatim() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "```json\n{\"results\": []}\n```" } }
			]
		});
		let text = parse_completion_text(&json).expect("parse failed");

		assert_eq!(text, "```json\n{\"results\": []}\n```");
	}

	#[test]
	fn joins_content_parts() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": [
					{ "type": "text", "text": "{\"results\": " },
					{ "type": "text", "text": "[]}" }
				] } }
			]
		});

		assert_eq!(parse_completion_text(&json).expect("parse failed"), "{\"results\": []}");
	}

	#[test]
	fn missing_choices_is_invalid() {
		let json = serde_json::json!({ "error": "overloaded" });

		assert!(matches!(parse_completion_text(&json), Err(Error::InvalidResponse { .. })));
	}
}
