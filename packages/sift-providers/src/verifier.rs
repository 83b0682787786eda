//! Verifier port: judge one result item against every screening criterion.

use serde_json::Value;

use sift_config::LlmProviderConfig;
use sift_domain::{
	AssessmentKind, Criterion, CriterionAssessment, Evidence, ResultItem, ValidationResult,
};

use crate::{Error, Result};

const VERIFIER_SYSTEM_PROMPT: &str = "\
You are a meticulous screening assistant. Judge the result against EVERY \
criterion using only the provided result fields. Respond with a single JSON \
object:
{
  \"criteria_assessment\": [
    {
      \"criterion_id\": \"...\",
      \"assessment\": \"support | somewhat_support | reject | insufficient_information\",
      \"explanation\": \"why the criterion is or is not met\",
      \"evidence\": [{ \"source\": \"title | content | <field>\", \"text\": \"verbatim quote\" }]
    }
  ],
  \"summary\": \"one line: what the result is and how it aligns with the query\"
}
Include one entry per criterion, in the given order.";

/// One verification call. The returned set covers every criterion; a
/// shorter model answer is an [`Error::InvalidResponse`], not a degraded
/// result.
pub async fn verify(
	cfg: &LlmProviderConfig,
	item: &ResultItem,
	criteria: &[Criterion],
	query: &str,
) -> Result<ValidationResult> {
	let user_prompt = build_user_prompt(item, criteria, query);
	let json = crate::chat_json(cfg, VERIFIER_SYSTEM_PROMPT, &user_prompt).await?;

	parse_validation_json(&json, criteria)
}

fn build_user_prompt(item: &ResultItem, criteria: &[Criterion], query: &str) -> String {
	let criteria_block = criteria
		.iter()
		.map(|criterion| {
			format!(
				"- {} [{}{}] {}: {}",
				criterion.id,
				criterion.category,
				if criterion.temporal { ", recency" } else { "" },
				criterion.name,
				criterion.description,
			)
		})
		.collect::<Vec<_>>()
		.join("\n");

	format!(
		"Original question:\n{query}\n\nCriteria:\n{criteria_block}\n\nResult ({}):\n{}",
		item.result_type,
		item.prompt_block(),
	)
}

fn parse_validation_json(json: &Value, criteria: &[Criterion]) -> Result<ValidationResult> {
	let Some(raw_assessments) = json.get("criteria_assessment").and_then(|v| v.as_array()) else {
		return Err(Error::InvalidResponse {
			message: "Verifier response is missing criteria_assessment.".to_string(),
		});
	};
	let summary = json
		.get("summary")
		.and_then(|v| v.as_str())
		.unwrap_or_default()
		.to_string();

	// Align to criteria order; the port contract requires full coverage.
	let mut criteria_assessment = Vec::with_capacity(criteria.len());

	for criterion in criteria {
		let Some(raw) = raw_assessments.iter().find(|raw| {
			raw.get("criterion_id").and_then(|v| v.as_str()) == Some(criterion.id.as_str())
		}) else {
			return Err(Error::InvalidResponse {
				message: format!("Verifier response does not cover criterion {}.", criterion.id),
			});
		};
		let assessment = AssessmentKind::parse_lenient(
			raw.get("assessment").and_then(|v| v.as_str()).unwrap_or_default(),
		);
		let evidence = raw
			.get("evidence")
			.and_then(|v| v.as_array())
			.map(|entries| {
				entries
					.iter()
					.filter_map(|entry| {
						Some(Evidence {
							source: entry.get("source")?.as_str()?.to_string(),
							text: entry.get("text")?.as_str()?.to_string(),
						})
					})
					.collect()
			})
			.unwrap_or_default();

		criteria_assessment.push(CriterionAssessment {
			criterion_id: criterion.id.clone(),
			assessment,
			explanation: raw
				.get("explanation")
				.and_then(|v| v.as_str())
				.unwrap_or_default()
				.to_string(),
			evidence,
		});
	}

	Ok(ValidationResult { criteria_assessment, summary })
}
