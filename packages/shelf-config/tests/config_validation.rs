use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use shelf_config::{Config, Error, ExtractionMode, UnknownCodePolicy};

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("shelf_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> shelf_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = shelf_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse test config.")
}

fn without_search_table() -> String {
	let mut value: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse fixture.");
	let root = value.as_table_mut().expect("Fixture must be a table.");

	root.remove("search");

	toml::to_string(&value).expect("Failed to render fixture.")
}

#[test]
fn sample_config_loads_and_normalizes() {
	let cfg = load_payload(SAMPLE_CONFIG_TOML.to_string()).expect("Expected sample config to load.");

	assert_eq!(cfg.storage.qdrant.collection, "product_embeddings");
	assert_eq!(cfg.storage.qdrant.vector_name, None);
	assert_eq!(cfg.search.top_k, 25);
	assert_eq!(cfg.search.deadline_ms, Some(90_000));
	assert!(cfg.providers.embedding.default_headers.is_empty());
}

#[test]
fn search_section_defaults_when_absent() {
	let cfg = load_payload(without_search_table()).expect("Expected config without search.");

	assert_eq!(cfg.search.top_k, 25);
	assert_eq!(cfg.search.extraction, ExtractionMode::Greedy);
	assert_eq!(cfg.search.unknown_codes, UnknownCodePolicy::Drop);
	assert_eq!(cfg.search.deadline_ms, None);
}

#[test]
fn missing_file_reports_read_error() {
	let mut path = env::temp_dir();

	path.push("shelf_config_test_missing_file.toml");

	let err = shelf_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }), "Unexpected error: {err}");
}

#[test]
fn malformed_toml_reports_parse_error() {
	let err = load_payload("[service\nhttp_bind = 1".to_string()).expect_err("Expected parse error.");

	assert!(matches!(err, Error::ParseConfig { .. }), "Unexpected error: {err}");
}

#[test]
fn embedding_dimensions_must_match_vector_dim() {
	let mut cfg = base_config();

	cfg.providers.embedding.dimensions = 1_536;

	let err = shelf_config::validate(&cfg).expect_err("Expected dimension mismatch.");

	assert!(
		err.to_string()
			.contains("providers.embedding.dimensions must match storage.qdrant.vector_dim."),
		"Unexpected error: {err}"
	);
}

#[test]
fn provider_api_keys_must_be_non_empty() {
	let mut cfg = base_config();

	cfg.providers.reasoning.api_key = "  ".to_string();

	let err = shelf_config::validate(&cfg).expect_err("Expected api_key validation error.");

	assert!(
		err.to_string().contains("Provider reasoning api_key must be non-empty."),
		"Unexpected error: {err}"
	);
}

#[test]
fn provider_timeouts_must_be_positive() {
	let mut cfg = base_config();

	cfg.providers.embedding.timeout_ms = 0;

	let err = shelf_config::validate(&cfg).expect_err("Expected timeout validation error.");

	assert!(
		err.to_string().contains("Provider embedding timeout_ms must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn reasoning_temperature_must_be_in_range() {
	let mut cfg = base_config();

	cfg.providers.reasoning.temperature = 2.5;

	let err = shelf_config::validate(&cfg).expect_err("Expected temperature validation error.");

	assert!(
		err.to_string().contains("providers.reasoning.temperature must be in the range 0.0-2.0."),
		"Unexpected error: {err}"
	);

	cfg.providers.reasoning.temperature = f32::NAN;

	let err = shelf_config::validate(&cfg).expect_err("Expected finite temperature error.");

	assert!(
		err.to_string().contains("providers.reasoning.temperature must be a finite number."),
		"Unexpected error: {err}"
	);
}

#[test]
fn search_top_k_must_be_positive() {
	let mut cfg = base_config();

	cfg.search.top_k = 0;

	let err = shelf_config::validate(&cfg).expect_err("Expected top_k validation error.");

	assert!(
		err.to_string().contains("search.top_k must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn search_policies_must_be_known() {
	let payload = SAMPLE_CONFIG_TOML.replace("extraction    = \"greedy\"", "extraction    = \"regex\"");
	let err = load_payload(payload).expect_err("Expected extraction parse error.");

	match err {
		Error::ParseConfig { source, .. } => assert!(
			source.message().contains("search.extraction must be one of greedy or balanced"),
			"Unexpected error: {source}"
		),
		other => panic!("Unexpected error: {other}"),
	}

	let payload = SAMPLE_CONFIG_TOML.replace("unknown_codes = \"drop\"", "unknown_codes = \"keep\"");
	let err = load_payload(payload).expect_err("Expected unknown_codes parse error.");

	match err {
		Error::ParseConfig { source, .. } => assert!(
			source.message().contains("search.unknown_codes must be one of drop or reject"),
			"Unexpected error: {source}"
		),
		other => panic!("Unexpected error: {other}"),
	}
}

#[test]
fn search_policies_are_case_insensitive_on_load() {
	let payload = SAMPLE_CONFIG_TOML
		.replace("extraction    = \"greedy\"", "extraction    = \" Balanced \"")
		.replace("unknown_codes = \"drop\"", "unknown_codes = \"REJECT\"");
	let cfg = load_payload(payload).expect("Expected policies to load.");

	assert_eq!(cfg.search.extraction, ExtractionMode::Balanced);
	assert_eq!(cfg.search.unknown_codes, UnknownCodePolicy::Reject);
}

#[test]
fn deadline_must_be_positive_when_present() {
	let mut cfg = base_config();

	cfg.search.deadline_ms = Some(0);

	let err = shelf_config::validate(&cfg).expect_err("Expected deadline validation error.");

	assert!(
		err.to_string().contains("search.deadline_ms must be greater than zero."),
		"Unexpected error: {err}"
	);

	cfg.search.deadline_ms = None;

	assert!(shelf_config::validate(&cfg).is_ok());
}
