use serde::Serialize;

use sift_domain::{PlanResult, RawVerifiedResult, RunCounts, ScoredResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
	Completed,
	CompletedWithErrors,
	NoResults,
	Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct BackendError {
	pub backend: String,
	pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
	pub request_id: String,
	pub query: String,
	pub status: RunStatus,
	pub processing_time_ms: u64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub plan: Option<PlanResult>,
	pub perfect_results: Vec<ScoredResult>,
	pub partial_results: Vec<ScoredResult>,
	pub rejected_count: usize,
	/// Populated instead of the scored buckets when classification is off.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub raw_results: Vec<RawVerifiedResult>,
	pub total_scanned: usize,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub backend_errors: Vec<BackendError>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl SearchResponse {
	/// Stub for a run that failed before producing anything, used for
	/// per-query failures inside a batch.
	pub fn failed_stub(request_id: String, query: &str, message: String) -> Self {
		Self {
			request_id,
			query: query.to_string(),
			status: RunStatus::Failed,
			processing_time_ms: 0,
			plan: None,
			perfect_results: Vec::new(),
			partial_results: Vec::new(),
			rejected_count: 0,
			raw_results: Vec::new(),
			total_scanned: 0,
			backend_errors: Vec::new(),
			error: Some(message),
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanResponse {
	pub request_id: String,
	pub query: String,
	pub plan: PlanResult,
	pub processing_time_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSearchResponse {
	pub request_id: String,
	pub results: Vec<SearchResponse>,
	pub processing_time_ms: u64,
	/// Rendered export of the perfect and partial rows, when requested.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub export: Option<String>,
}

/// Terminal accounting for one run, also the payload of the streaming
/// `done` event.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
	pub status: RunStatus,
	#[serde(flatten)]
	pub counts: RunCounts,
	pub processing_time_ms: u64,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub backend_errors: Vec<BackendError>,
}
