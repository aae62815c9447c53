mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, ExtractionMode, LlmProviderConfig, Providers, Qdrant, Search,
	Service, Storage, UnknownCodePolicy,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::validation("service.http_bind must be non-empty."));
	}
	if cfg.storage.qdrant.url.trim().is_empty() {
		return Err(Error::validation("storage.qdrant.url must be non-empty."));
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::validation("storage.qdrant.collection must be non-empty."));
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::validation(
			"providers.embedding.dimensions must be greater than zero.",
		));
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::validation(
			"providers.embedding.dimensions must match storage.qdrant.vector_dim.",
		));
	}

	let embedding = &cfg.providers.embedding;
	let reasoning = &cfg.providers.reasoning;

	for (label, api_base, api_key, model, timeout_ms) in [
		(
			"embedding",
			&embedding.api_base,
			&embedding.api_key,
			&embedding.model,
			embedding.timeout_ms,
		),
		(
			"reasoning",
			&reasoning.api_base,
			&reasoning.api_key,
			&reasoning.model,
			reasoning.timeout_ms,
		),
	] {
		if api_base.trim().is_empty() {
			return Err(Error::validation(format!("Provider {label} api_base must be non-empty.")));
		}
		if api_key.trim().is_empty() {
			return Err(Error::validation(format!("Provider {label} api_key must be non-empty.")));
		}
		if model.trim().is_empty() {
			return Err(Error::validation(format!("Provider {label} model must be non-empty.")));
		}
		if timeout_ms == 0 {
			return Err(Error::validation(format!(
				"Provider {label} timeout_ms must be greater than zero."
			)));
		}
	}

	if !reasoning.temperature.is_finite() {
		return Err(Error::validation(
			"providers.reasoning.temperature must be a finite number.",
		));
	}
	if !(0.0..=2.0).contains(&reasoning.temperature) {
		return Err(Error::validation(
			"providers.reasoning.temperature must be in the range 0.0-2.0.",
		));
	}
	if cfg.search.top_k == 0 {
		return Err(Error::validation("search.top_k must be greater than zero."));
	}

	if let Some(deadline_ms) = cfg.search.deadline_ms
		&& deadline_ms == 0
	{
		return Err(Error::validation("search.deadline_ms must be greater than zero."));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.storage.qdrant.vector_name.as_deref().map(|name| name.trim().is_empty()).unwrap_or(false)
	{
		cfg.storage.qdrant.vector_name = None;
	}
}
