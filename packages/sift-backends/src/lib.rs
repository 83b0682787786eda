mod error;
pub mod meilisearch;
pub mod opensearch;
pub mod registry;
pub mod wikipedia;

pub use error::{Error, Result};
pub use registry::BackendRegistry;

use std::{future::Future, pin::Pin};

use serde::Serialize;

use sift_domain::ResultItem;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
	Healthy,
	Degraded,
	Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackendHealth {
	pub status: HealthStatus,
	pub latency_ms: u64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

/// Contract every search backend implements.
///
/// `search` must return an empty list (not an error) when nothing matches.
/// `health_check` serves the operational surface only; the pipeline never
/// consults it.
pub trait SearchBackend
where
	Self: Send + Sync,
{
	fn name(&self) -> &str;

	fn search<'a>(
		&'a self,
		query: &'a str,
		max_results: u32,
	) -> BoxFuture<'a, Result<Vec<ResultItem>>>;

	fn fetch_document<'a>(&'a self, doc_id: &'a str) -> BoxFuture<'a, Result<ResultItem>>;

	fn health_check<'a>(&'a self) -> BoxFuture<'a, BackendHealth>;
}
