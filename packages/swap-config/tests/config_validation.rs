use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use swap_config::{Config, DistanceUnit, Error};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml_with(section: &str, key: &str, value: Value) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let mut table = root.as_table_mut().expect("Template config must be a table.");

	for part in section.split('.') {
		table = table
			.get_mut(part)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{section}]."));
	}

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("swap_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> swap_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = swap_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn expect_validation(payload: String, expected: &str) {
	let err = load_payload(payload).expect_err("Expected validation error.");

	assert!(matches!(err, Error::Validation { .. }), "Unexpected error: {err:?}");

	let message = err.to_string();

	assert!(message.contains(expected), "Unexpected error message: {message}");
}

#[test]
fn sample_config_loads() {
	let cfg = load_payload(SAMPLE_CONFIG_TEMPLATE_TOML.to_string()).expect("Sample must load.");

	assert_eq!(cfg.discovery.default_limit, 10);
	assert_eq!(cfg.discovery.max_limit, 100);
	assert_eq!(cfg.discovery.distance_unit, DistanceUnit::Miles);
	assert!(!cfg.discovery.text.preserve_trailing_space_quirk);
	assert_eq!(cfg.attachments.list_view_max, 1);
}

#[test]
fn blank_api_auth_token_is_normalized_to_none() {
	let cfg = load_payload(SAMPLE_CONFIG_TEMPLATE_TOML.to_string()).expect("Sample must load.");

	assert!(cfg.security.api_auth_token.is_none());
}

#[test]
fn allowed_extensions_are_normalized() {
	let payload = sample_toml_with(
		"attachments",
		"allowed_extensions",
		Value::Array(vec![Value::String(".JPG".to_string()), Value::String(" png ".to_string())]),
	);
	let cfg = load_payload(payload).expect("Config must load.");

	assert_eq!(cfg.attachments.allowed_extensions, vec!["jpg".to_string(), "png".to_string()]);
}

#[test]
fn default_limit_must_not_exceed_max_limit() {
	let payload = sample_toml_with("discovery", "default_limit", Value::Integer(101));

	expect_validation(payload, "discovery.default_limit must not exceed discovery.max_limit.");
}

#[test]
fn default_limit_must_be_positive() {
	let payload = sample_toml_with("discovery", "default_limit", Value::Integer(0));

	expect_validation(payload, "discovery.default_limit must be greater than zero.");
}

#[test]
fn default_radius_must_not_be_negative() {
	let payload = sample_toml_with("discovery", "default_radius", Value::Float(-1.0));

	expect_validation(payload, "discovery.default_radius must be zero or greater.");
}

#[test]
fn min_similarity_must_be_in_range() {
	let payload = sample_toml_with("discovery.text", "min_similarity", Value::Float(3.5));

	expect_validation(payload, "discovery.text.min_similarity must be in the range 0.0-2.0.");
}

#[test]
fn shipped_similarity_is_looser_than_the_near_exact_setting() {
	let shipped = load_payload(SAMPLE_CONFIG_TEMPLATE_TOML.to_string()).expect("Sample must load.");

	assert_eq!(shipped.discovery.text.min_similarity, 0.8);
	assert!(SAMPLE_CONFIG_TEMPLATE_TOML.contains("roughly 0.99"));

	let payload = sample_toml_with("discovery.text", "min_similarity", Value::Float(0.99));
	let near_exact = load_payload(payload).expect("0.99 must load.");

	assert_eq!(near_exact.discovery.text.min_similarity, 0.99);
}

#[test]
fn fetch_timeout_must_be_positive() {
	let payload = sample_toml_with("attachments", "fetch_timeout_ms", Value::Integer(0));

	expect_validation(payload, "attachments.fetch_timeout_ms must be greater than zero.");
}

#[test]
fn allowed_extensions_must_not_be_empty() {
	let payload = sample_toml_with("attachments", "allowed_extensions", Value::Array(Vec::new()));

	expect_validation(payload, "attachments.allowed_extensions must be non-empty.");
}

#[test]
fn unknown_distance_unit_fails_to_parse() {
	let payload =
		sample_toml_with("discovery", "distance_unit", Value::String("furlongs".to_string()));
	let err = load_payload(payload).expect_err("Expected parse error.");

	assert!(matches!(err, Error::ParseConfig { .. }), "Unexpected error: {err:?}");
}

#[test]
fn missing_file_reports_read_error() {
	let mut path = env::temp_dir();

	path.push("swap_config_test_missing_file.toml");

	let err = swap_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }));
}
