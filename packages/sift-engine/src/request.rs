use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	#[serde(default)]
	pub options: SearchOptions,
}

/// Per-request knobs. Everything not listed here (worker-pool size, retry
/// policy, run deadline default) is deployment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
	/// Ask the planner to decompose the query into variants and criteria.
	/// When off, the raw query runs against a single relevance criterion.
	pub decompose: bool,
	pub verify: bool,
	pub classify: bool,
	pub stream: bool,
	/// Per backend, per generated query.
	pub max_results: u32,
	/// `None` selects every configured backend.
	pub backends: Option<Vec<String>>,
	/// Overrides the configured run deadline.
	pub timeout_ms: Option<u64>,
}

impl Default for SearchOptions {
	fn default() -> Self {
		Self {
			decompose: true,
			verify: true,
			classify: true,
			stream: false,
			max_results: 10,
			backends: None,
			timeout_ms: None,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSearchRequest {
	pub queries: Vec<String>,
	#[serde(default)]
	pub options: SearchOptions,
	#[serde(default)]
	pub export_format: Option<ExportFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
	Csv,
	Json,
}
