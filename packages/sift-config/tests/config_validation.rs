use toml::Value;

use sift_config::{Config, Error};

const SAMPLE_CONFIG_TOML: &str = r#"
[service]
http_bind = "127.0.0.1:8080"
log_level = "info"

[providers.planner]
provider_id = "wismodel"
api_base    = "http://localhost:9000/v1"
api_key     = "test-key"
model       = "wismodel-planner"

[providers.verifier]
provider_id = "wismodel"
api_base    = "http://localhost:9000/v1"
api_key     = "test-key"
model       = "wismodel-verifier"

[search]
default_backends = ["wikipedia"]
verify_workers   = 4

[backends.wikipedia]
api_base = "https://en.wikipedia.org/w/api.php"
"#;

fn sample_config() -> Value {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.")
}

fn parse(value: Value) -> Result<Config, Error> {
	let raw = toml::to_string(&value).expect("Failed to render config.");
	let cfg: Config = toml::from_str(&raw).expect("Failed to deserialize config.");

	sift_config::validate(&cfg).map(|()| cfg)
}

#[test]
fn sample_config_is_valid() {
	let cfg = parse(sample_config()).expect("Sample config must validate.");

	assert_eq!(cfg.search.verify_workers, 4);
	assert_eq!(cfg.search.verify_retries, 2);
	assert_eq!(cfg.search.default_backends, vec!["wikipedia".to_string()]);
	assert_eq!(cfg.providers.planner.path, "/chat/completions");
}

#[test]
fn rejects_zero_verify_workers() {
	let mut value = sample_config();

	value
		.as_table_mut()
		.and_then(|root| root.get_mut("search"))
		.and_then(Value::as_table_mut)
		.expect("Sample config must include [search].")
		.insert("verify_workers".to_string(), Value::Integer(0));

	let err = parse(value).expect_err("Zero workers must be rejected.");

	assert!(matches!(err, Error::Validation { .. }));
}

#[test]
fn rejects_empty_provider_api_key() {
	let mut value = sample_config();

	value
		.as_table_mut()
		.and_then(|root| root.get_mut("providers"))
		.and_then(Value::as_table_mut)
		.and_then(|providers| providers.get_mut("verifier"))
		.and_then(Value::as_table_mut)
		.expect("Sample config must include [providers.verifier].")
		.insert("api_key".to_string(), Value::String(String::new()));

	let err = parse(value).expect_err("Empty api_key must be rejected.");

	assert!(matches!(err, Error::Validation { .. }));
}

#[test]
fn rejects_default_backend_without_section() {
	let mut value = sample_config();

	value
		.as_table_mut()
		.and_then(|root| root.get_mut("search"))
		.and_then(Value::as_table_mut)
		.expect("Sample config must include [search].")
		.insert(
			"default_backends".to_string(),
			Value::Array(vec![Value::String("meilisearch".to_string())]),
		);

	let err = parse(value).expect_err("Unconfigured backend must be rejected.");

	assert!(matches!(err, Error::Validation { .. }));
}

#[test]
fn rejects_unknown_backend_name() {
	let mut value = sample_config();

	value
		.as_table_mut()
		.and_then(|root| root.get_mut("search"))
		.and_then(Value::as_table_mut)
		.expect("Sample config must include [search].")
		.insert(
			"default_backends".to_string(),
			Value::Array(vec![Value::String("solr".to_string())]),
		);

	let err = parse(value).expect_err("Unknown backend must be rejected.");

	assert!(matches!(err, Error::Validation { .. }));
}
