pub mod aggregate;
pub mod assessment;
pub mod classifier;
pub mod criteria;
pub mod result;

pub use aggregate::{Aggregator, Buckets, RunCounts};
pub use assessment::{
	AssessmentKind, Classification, CriterionAssessment, Evidence, RawVerifiedResult, ScoredResult,
	ValidationResult,
};
pub use classifier::{classify, fallback_validation, score_result};
pub use criteria::{Criterion, PlanResult};
pub use result::ResultItem;
