//! Pipeline orchestrator: Plan, Search, Verify, Classify, Aggregate.
//!
//! One internal event-production path serves both output modes. Batch mode
//! drains it into a [`SearchResponse`]; streaming mode forwards each event to
//! a bounded channel as it is produced.

mod engine;
mod error;
pub mod events;
pub mod export;
pub mod request;
pub mod response;

pub use error::{Error, Result};
pub use events::{ResultPayload, StreamEvent};
pub use request::{BatchSearchRequest, ExportFormat, SearchOptions, SearchRequest};
pub use response::{
	BackendError, BatchSearchResponse, PlanResponse, RunStatus, RunSummary, SearchResponse,
};

use std::{future::Future, pin::Pin, sync::Arc};

use sift_backends::BackendRegistry;
use sift_config::{Config, LlmProviderConfig};
use sift_domain::{Criterion, PlanResult, ResultItem, ValidationResult};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait PlannerProvider
where
	Self: Send + Sync,
{
	fn plan<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<PlanResult>>;
}

pub trait VerifierProvider
where
	Self: Send + Sync,
{
	fn verify<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		item: &'a ResultItem,
		criteria: &'a [Criterion],
		query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<ValidationResult>>;
}

#[derive(Clone)]
pub struct Providers {
	pub planner: Arc<dyn PlannerProvider>,
	pub verifier: Arc<dyn VerifierProvider>,
}

impl Default for Providers {
	fn default() -> Self {
		Self { planner: Arc::new(DefaultPlanner), verifier: Arc::new(DefaultVerifier) }
	}
}

pub struct DefaultPlanner;

impl PlannerProvider for DefaultPlanner {
	fn plan<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<PlanResult>> {
		Box::pin(async move { Ok(sift_providers::planner::plan(cfg, query).await?) })
	}
}

pub struct DefaultVerifier;

impl VerifierProvider for DefaultVerifier {
	fn verify<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		item: &'a ResultItem,
		criteria: &'a [Criterion],
		query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<ValidationResult>> {
		Box::pin(
			async move { Ok(sift_providers::verifier::verify(cfg, item, criteria, query).await?) },
		)
	}
}

pub struct SiftEngine {
	pub cfg: Config,
	pub backends: BackendRegistry,
	pub providers: Providers,
}

impl SiftEngine {
	pub fn new(cfg: Config, backends: BackendRegistry) -> Self {
		Self { cfg, backends, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, backends: BackendRegistry, providers: Providers) -> Self {
		Self { cfg, backends, providers }
	}
}
