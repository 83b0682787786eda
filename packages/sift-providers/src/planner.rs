//! Planner port: turn a natural-language query into search queries plus
//! weighted screening criteria.

use serde_json::Value;
use time::OffsetDateTime;

use sift_config::LlmProviderConfig;
use sift_domain::{Criterion, PlanResult};

use crate::{Error, Result};

const PLANNER_SYSTEM_PROMPT: &str = "\
You are a search planning assistant. Decompose the user's question into \
search queries and screening criteria. Respond with a single JSON object:
{
  \"search_queries\": [\"...\"],            // 2-4 keyword queries
  \"criteria\": [                           // 1-4 screening criteria
    {
      \"criterion_id\": \"criterion_1\",
      \"type\": \"task | method | topic | time | population\",
      \"name\": \"...\",
      \"description\": \"one-sentence rule checkable against a result\",
      \"weight\": 0.5                       // weights sum to 1.0
    }
  ]
}
Use type \"time\" only for recency requirements.";

/// One planning call. Fails with an error (never a degraded plan); the
/// orchestrator decides whether to fall back to [`fallback_plan`].
pub async fn plan(cfg: &LlmProviderConfig, query: &str) -> Result<PlanResult> {
	let now = OffsetDateTime::now_utc();
	let user_prompt = format!(
		"Current date: {}-{:02}-{:02}\n\nQuestion:\n{query}",
		now.year(),
		now.month() as u8,
		now.day(),
	);
	let json = crate::chat_json(cfg, PLANNER_SYSTEM_PROMPT, &user_prompt).await?;

	parse_plan_json(&json)
}

/// Heuristic plan used when decomposition is disabled or the planner call
/// fails: query variants for recall plus a single relevance criterion.
pub fn fallback_plan(query: &str) -> PlanResult {
	let mut queries = vec![query.to_string()];
	let tokens: Vec<&str> = query.split_whitespace().collect();

	if tokens.len() >= 4 {
		let mid = tokens.len() / 2;

		queries.push(tokens[..mid].join(" "));
		queries.push(tokens[mid..].join(" "));
	} else if tokens.len() >= 2 {
		queries.push(tokens.iter().rev().copied().collect::<Vec<_>>().join(" "));
	} else {
		queries.push(format!("{query} overview"));
	}

	let mut seen = std::collections::HashSet::new();

	queries.retain(|q| seen.insert(q.trim().to_lowercase()));

	PlanResult {
		search_queries: queries,
		criteria: vec![Criterion {
			id: "criterion_1".to_string(),
			category: "topic".to_string(),
			name: "Query relevance".to_string(),
			description: format!("The result is directly relevant to: {query}"),
			weight: 1.0,
			temporal: false,
		}],
	}
}

fn parse_plan_json(json: &Value) -> Result<PlanResult> {
	let Some(search_queries) = json.get("search_queries").and_then(|v| v.as_array()) else {
		return Err(Error::InvalidResponse {
			message: "Planner response is missing search_queries.".to_string(),
		});
	};
	let search_queries: Vec<String> = search_queries
		.iter()
		.filter_map(|q| q.as_str())
		.filter(|q| !q.trim().is_empty())
		.map(|q| q.to_string())
		.collect();

	if search_queries.is_empty() {
		return Err(Error::InvalidResponse {
			message: "Planner response contains no usable search queries.".to_string(),
		});
	}

	let Some(criteria_raw) = json.get("criteria").and_then(|v| v.as_array()) else {
		return Err(Error::InvalidResponse {
			message: "Planner response is missing criteria.".to_string(),
		});
	};
	let mut criteria = Vec::with_capacity(criteria_raw.len());

	for (i, raw) in criteria_raw.iter().enumerate() {
		let category = raw
			.get("type")
			.and_then(|v| v.as_str())
			.unwrap_or("topic")
			.to_string();

		criteria.push(Criterion {
			id: raw
				.get("criterion_id")
				.and_then(|v| v.as_str())
				.map(|s| s.to_string())
				.unwrap_or_else(|| format!("criterion_{}", i + 1)),
			temporal: category == "time",
			name: raw
				.get("name")
				.and_then(|v| v.as_str())
				.map(|s| s.to_string())
				.unwrap_or_else(|| format!("Criterion {}", i + 1)),
			description: raw
				.get("description")
				.and_then(|v| v.as_str())
				.unwrap_or_default()
				.to_string(),
			weight: raw.get("weight").and_then(|v| v.as_f64()).unwrap_or(0.0) as f32,
			category,
		});
	}

	if criteria.is_empty() {
		return Err(Error::InvalidResponse {
			message: "Planner response contains no criteria.".to_string(),
		});
	}

	normalize_weights(&mut criteria);

	Ok(PlanResult { search_queries, criteria })
}

// The model is asked for weights summing to 1.0 but drifts; rescale when
// the sum is off by more than 0.05.
fn normalize_weights(criteria: &mut [Criterion]) {
	let total: f32 = criteria.iter().map(|c| c.weight).sum();

	if (total - 1.0).abs() <= 0.05 {
		return;
	}

	if total > 0.0 {
		for criterion in criteria.iter_mut() {
			criterion.weight /= total;
		}
	} else {
		let even = 1.0 / criteria.len() as f32;

		for criterion in criteria.iter_mut() {
			criterion.weight = even;
		}
	}
}
