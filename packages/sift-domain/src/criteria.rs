//! Screening criteria and the plan produced from a user query.

use serde::{Deserialize, Serialize};

/// One weighted screening rule derived from the user's query.
///
/// A criterion flagged `temporal` filters by recency rather than substance;
/// the classifier treats it as a secondary gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
	pub id: String,
	/// Free-form category tag (task, method, topic, time, ...).
	pub category: String,
	pub name: String,
	pub description: String,
	/// Weight in (0, 1]. Weights need not sum to 1; scoring normalizes.
	pub weight: f32,
	#[serde(default)]
	pub temporal: bool,
}

/// Output of the planning stage: search queries for retrieval plus criteria
/// for screening. Immutable for the rest of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
	pub search_queries: Vec<String>,
	pub criteria: Vec<Criterion>,
}

impl PlanResult {
	pub fn weight_sum(&self) -> f32 {
		self.criteria.iter().map(|criterion| criterion.weight).sum()
	}
}
