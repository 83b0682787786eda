//! Pure accumulator over classified (or raw) results.
//!
//! Mutated only from the orchestrator's single completion funnel, so it
//! carries no locking of its own.

use serde::Serialize;

use crate::assessment::{Classification, RawVerifiedResult, ScoredResult};

/// Running aggregate counts, queryable mid-run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounts {
	pub total_scanned: usize,
	pub perfect_count: usize,
	pub partial_count: usize,
	pub rejected_count: usize,
}

/// Final per-label buckets, each ordered by original scan index.
#[derive(Debug, Default)]
pub struct Buckets {
	pub perfect: Vec<ScoredResult>,
	pub partial: Vec<ScoredResult>,
	pub rejected: Vec<ScoredResult>,
	pub raw: Vec<RawVerifiedResult>,
}

#[derive(Debug, Default)]
pub struct Aggregator {
	perfect: Vec<ScoredResult>,
	partial: Vec<ScoredResult>,
	rejected: Vec<ScoredResult>,
	raw: Vec<RawVerifiedResult>,
}

impl Aggregator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record(&mut self, scored: ScoredResult) -> Classification {
		let classification = scored.classification;

		match classification {
			Classification::Perfect => self.perfect.push(scored),
			Classification::Partial => self.partial.push(scored),
			Classification::Reject => self.rejected.push(scored),
		}

		classification
	}

	pub fn record_raw(&mut self, raw: RawVerifiedResult) {
		self.raw.push(raw);
	}

	pub fn counts(&self) -> RunCounts {
		RunCounts {
			total_scanned: self.perfect.len()
				+ self.partial.len()
				+ self.rejected.len()
				+ self.raw.len(),
			perfect_count: self.perfect.len(),
			partial_count: self.partial.len(),
			rejected_count: self.rejected.len(),
		}
	}

	/// Finalize into stable buckets. Completion order is non-deterministic,
	/// so each bucket is re-sorted by original scan index here.
	pub fn finish(mut self) -> Buckets {
		self.perfect.sort_by_key(|scored| scored.index);
		self.partial.sort_by_key(|scored| scored.index);
		self.rejected.sort_by_key(|scored| scored.index);
		self.raw.sort_by_key(|raw| raw.index);

		Buckets {
			perfect: self.perfect,
			partial: self.partial,
			rejected: self.rejected,
			raw: self.raw,
		}
	}
}
