//! Deterministic perfect/partial/reject classification.
//!
//! Rules:
//!   - perfect: every assessment, temporal criteria included, is `support`.
//!   - reject:  every assessment is `reject`, or every non-temporal
//!     assessment is `reject` (the item fails on substance even when it
//!     matches on recency).
//!   - partial: everything else, including all-insufficient_information
//!     verdict sets.
//!
//! The score maps support/somewhat_support/insufficient_information/reject
//! to 1.0/0.5/0.25/0.0, weights each by its criterion weight, normalizes by
//! the weight sum, and clamps to [0, 1].

use std::collections::HashMap;

use crate::{
	assessment::{
		AssessmentKind, Classification, CriterionAssessment, RawVerifiedResult, ScoredResult,
		ValidationResult,
	},
	criteria::Criterion,
	result::ResultItem,
};

/// Classify one validated result. Pure; callers must not pass an empty
/// criteria set (the orchestrator treats an empty plan as a fatal planning
/// error before anything reaches this point).
pub fn classify(criteria: &[Criterion], validation: &ValidationResult) -> (Classification, f32) {
	let by_id: HashMap<&str, &Criterion> =
		criteria.iter().map(|criterion| (criterion.id.as_str(), criterion)).collect();
	let label = label_for(&validation.criteria_assessment, &by_id);
	let score = weighted_score(&validation.criteria_assessment, &by_id);

	(label, score)
}

/// Classify and wrap into the terminal [`ScoredResult`].
pub fn score_result(
	index: usize,
	item: ResultItem,
	validation: ValidationResult,
	criteria: &[Criterion],
) -> ScoredResult {
	let (classification, weighted_score) = classify(criteria, &validation);

	ScoredResult { index, result: item, validation, classification, weighted_score }
}

/// Sentinel validation substituted when verification is skipped or a single
/// item's verification fails after retry exhaustion.
pub fn fallback_validation(criteria: &[Criterion]) -> ValidationResult {
	ValidationResult {
		criteria_assessment: criteria
			.iter()
			.map(|criterion| CriterionAssessment {
				criterion_id: criterion.id.clone(),
				assessment: AssessmentKind::InsufficientInformation,
				explanation: "Verification unavailable for this result.".to_string(),
				evidence: Vec::new(),
			})
			.collect(),
		summary: "Result was not verified.".to_string(),
	}
}

fn label_for(
	assessments: &[CriterionAssessment],
	by_id: &HashMap<&str, &Criterion>,
) -> Classification {
	if assessments.is_empty() {
		return Classification::Reject;
	}

	let all_support =
		assessments.iter().all(|a| a.assessment == AssessmentKind::Support);

	if all_support {
		return Classification::Perfect;
	}

	let all_reject = assessments.iter().all(|a| a.assessment == AssessmentKind::Reject);

	if all_reject {
		return Classification::Reject;
	}

	// Two-tier check: substantive criteria first, temporal as a gate. An
	// item whose every non-temporal criterion is rejected fails on substance
	// regardless of how the temporal criteria came out.
	let substantive: Vec<&CriterionAssessment> = assessments
		.iter()
		.filter(|a| !by_id.get(a.criterion_id.as_str()).map(|c| c.temporal).unwrap_or(false))
		.collect();

	if !substantive.is_empty()
		&& substantive.iter().all(|a| a.assessment == AssessmentKind::Reject)
	{
		return Classification::Reject;
	}

	Classification::Partial
}

fn weighted_score(
	assessments: &[CriterionAssessment],
	by_id: &HashMap<&str, &Criterion>,
) -> f32 {
	let weight_sum: f32 = by_id.values().map(|criterion| criterion.weight).sum();

	if weight_sum <= 0.0 {
		return 0.0;
	}

	let total: f32 = assessments
		.iter()
		.filter_map(|a| {
			by_id
				.get(a.criterion_id.as_str())
				.map(|criterion| a.assessment.score() * criterion.weight)
		})
		.sum();

	(total / weight_sum).clamp(0.0, 1.0)
}
