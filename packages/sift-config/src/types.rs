use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub backends: Backends,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Providers {
	pub planner: LlmProviderConfig,
	pub verifier: LlmProviderConfig,
}

/// One OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	#[serde(default = "default_chat_path")]
	pub path: String,
	pub model: String,
	#[serde(default = "default_temperature")]
	pub temperature: f32,
	#[serde(default = "default_max_tokens")]
	pub max_tokens: u32,
	#[serde(default = "default_provider_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Pipeline tuning. The verification worker-pool size and retry policy are
/// deployment constants, not request options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Search {
	#[serde(default)]
	pub default_backends: Vec<String>,
	#[serde(default = "default_verify_workers")]
	pub verify_workers: u32,
	#[serde(default = "default_verify_retries")]
	pub verify_retries: u32,
	#[serde(default = "default_retry_backoff_ms")]
	pub retry_backoff_ms: u64,
	#[serde(default = "default_run_timeout_ms")]
	pub run_timeout_ms: u64,
	#[serde(default = "default_stream_buffer")]
	pub stream_buffer: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Backends {
	#[serde(default)]
	pub meilisearch: Option<MeilisearchBackend>,
	#[serde(default)]
	pub opensearch: Option<OpenSearchBackend>,
	#[serde(default)]
	pub wikipedia: Option<WikipediaBackend>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeilisearchBackend {
	pub url: String,
	pub index: String,
	#[serde(default)]
	pub api_key: Option<String>,
	#[serde(default = "default_backend_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSearchBackend {
	pub url: String,
	pub index: String,
	#[serde(default)]
	pub username: Option<String>,
	#[serde(default)]
	pub password: Option<String>,
	#[serde(default = "default_backend_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikipediaBackend {
	#[serde(default = "default_wikipedia_api_base")]
	pub api_base: String,
	#[serde(default = "default_backend_timeout_ms")]
	pub timeout_ms: u64,
}

impl Default for Search {
	fn default() -> Self {
		Self {
			default_backends: Vec::new(),
			verify_workers: default_verify_workers(),
			verify_retries: default_verify_retries(),
			retry_backoff_ms: default_retry_backoff_ms(),
			run_timeout_ms: default_run_timeout_ms(),
			stream_buffer: default_stream_buffer(),
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_chat_path() -> String {
	"/chat/completions".to_string()
}

fn default_temperature() -> f32 {
	0.1
}

fn default_max_tokens() -> u32 {
	4_096
}

fn default_provider_timeout_ms() -> u64 {
	60_000
}

fn default_verify_workers() -> u32 {
	8
}

fn default_verify_retries() -> u32 {
	2
}

fn default_retry_backoff_ms() -> u64 {
	500
}

fn default_run_timeout_ms() -> u64 {
	120_000
}

fn default_stream_buffer() -> u32 {
	32
}

fn default_backend_timeout_ms() -> u64 {
	10_000
}

fn default_wikipedia_api_base() -> String {
	"https://en.wikipedia.org/w/api.php".to_string()
}
