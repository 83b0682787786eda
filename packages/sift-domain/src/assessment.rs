//! Verifier verdicts and the terminal classified result shapes.

use serde::{Deserialize, Serialize};

use crate::result::ResultItem;

/// Verdict for one (result, criterion) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentKind {
	Support,
	SomewhatSupport,
	Reject,
	InsufficientInformation,
}

impl AssessmentKind {
	/// Contribution of this verdict to the weighted score.
	pub fn score(self) -> f32 {
		match self {
			Self::Support => 1.0,
			Self::SomewhatSupport => 0.5,
			Self::InsufficientInformation => 0.25,
			Self::Reject => 0.0,
		}
	}

	/// Parse a verdict string from model output. Unknown strings map to
	/// `InsufficientInformation` rather than failing the whole validation.
	pub fn parse_lenient(raw: &str) -> Self {
		match raw {
			"support" => Self::Support,
			"somewhat_support" => Self::SomewhatSupport,
			"reject" => Self::Reject,
			_ => Self::InsufficientInformation,
		}
	}
}

/// A quoted snippet backing an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
	/// Field the evidence was extracted from (title, content, ...).
	pub source: String,
	pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionAssessment {
	pub criterion_id: String,
	pub assessment: AssessmentKind,
	pub explanation: String,
	#[serde(default)]
	pub evidence: Vec<Evidence>,
}

/// Complete verdict set for one result item. The verifier port guarantees
/// one assessment per criterion; a shorter set is a port error upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
	pub criteria_assessment: Vec<CriterionAssessment>,
	pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
	Perfect,
	Partial,
	Reject,
}

/// Terminal output of the funnel for one item: the raw item, its validation,
/// the classification label, and the normalized weighted score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
	/// Original scan index in the merged search output.
	pub index: usize,
	pub result: ResultItem,
	pub validation: ValidationResult,
	pub classification: Classification,
	pub weighted_score: f32,
}

/// A verified but unclassified result, returned when classification is
/// disabled for the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawVerifiedResult {
	pub index: usize,
	pub result: ResultItem,
	pub validation: ValidationResult,
}
