//! The internal event vocabulary both output modes drain.
//!
//! Per run: one `plan`, at most one `search_ready`, one `result` per scanned
//! item, then exactly one of `done` or `error`.

use serde::Serialize;
use serde_json::Value;

use sift_domain::{PlanResult, RawVerifiedResult, ResultItem, ScoredResult};

use crate::response::RunSummary;

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResultPayload {
	Scored(ScoredResult),
	Raw(RawVerifiedResult),
}

#[derive(Debug, Clone)]
pub enum StreamEvent {
	Plan { plan: PlanResult },
	SearchReady { total: usize, results: Vec<ResultItem> },
	Result { sequence: usize, total: usize, payload: ResultPayload },
	Done { summary: RunSummary },
	Error { message: String, summary: Option<RunSummary> },
}

impl StreamEvent {
	pub fn name(&self) -> &'static str {
		match self {
			Self::Plan { .. } => "plan",
			Self::SearchReady { .. } => "search_ready",
			Self::Result { .. } => "result",
			Self::Done { .. } => "done",
			Self::Error { .. } => "error",
		}
	}

	pub fn payload_json(&self) -> serde_json::Result<Value> {
		match self {
			Self::Plan { plan } => serde_json::to_value(plan),
			Self::SearchReady { total, results } => {
				Ok(serde_json::json!({ "total": total, "results": results }))
			},
			Self::Result { sequence, total, payload } => Ok(serde_json::json!({
				"sequence": sequence,
				"total": total,
				"result": serde_json::to_value(payload)?,
			})),
			Self::Done { summary } => serde_json::to_value(summary),
			Self::Error { message, summary } => {
				let mut body = serde_json::json!({ "message": message });

				if let Some(summary) = summary {
					body["summary"] = serde_json::to_value(summary)?;
				}

				Ok(body)
			},
		}
	}
}
