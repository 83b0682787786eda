//! In-memory fakes and fixture builders for exercising the pipeline without
//! live search backends or model endpoints.

use std::{
	collections::{HashMap, HashSet},
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use color_eyre::eyre::eyre;

use sift_backends::{BackendHealth, BackendRegistry, HealthStatus, SearchBackend};
use sift_config::{Backends, Config, LlmProviderConfig, Providers as ProviderSections, Search, Service};
use sift_domain::{
	AssessmentKind, Criterion, CriterionAssessment, PlanResult, ResultItem, ValidationResult,
};
use sift_engine::{BoxFuture, PlannerProvider, Providers, SiftEngine, VerifierProvider};

// --- fixture builders ---

pub fn criterion(id: &str, weight: f32) -> Criterion {
	Criterion {
		id: id.to_string(),
		category: "topic".to_string(),
		name: format!("Criterion {id}"),
		description: format!("Screening rule {id}."),
		weight,
		temporal: false,
	}
}

pub fn temporal_criterion(id: &str, weight: f32) -> Criterion {
	Criterion { category: "time".to_string(), temporal: true, ..criterion(id, weight) }
}

pub fn item(id: &str, title: &str) -> ResultItem {
	ResultItem {
		id: id.to_string(),
		backend: "static".to_string(),
		result_type: "generic".to_string(),
		title: title.to_string(),
		content: format!("Body of {title}."),
		source_url: format!("https://example.invalid/{id}"),
		fields: serde_json::Map::new(),
	}
}

pub fn plan(queries: &[&str], criteria: Vec<Criterion>) -> PlanResult {
	PlanResult {
		search_queries: queries.iter().map(|q| q.to_string()).collect(),
		criteria,
	}
}

fn provider_section(provider_id: &str) -> LlmProviderConfig {
	LlmProviderConfig {
		provider_id: provider_id.to_string(),
		api_base: "http://127.0.0.1:1/v1".to_string(),
		api_key: "test-key".to_string(),
		path: "/chat/completions".to_string(),
		model: "test-model".to_string(),
		temperature: 0.1,
		max_tokens: 1_024,
		timeout_ms: 1_000,
		default_headers: serde_json::Map::new(),
	}
}

/// A minimal valid config. Provider endpoints point at an unroutable
/// address; tests swap in fake providers instead of calling them.
pub fn test_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		providers: ProviderSections {
			planner: provider_section("planner"),
			verifier: provider_section("verifier"),
		},
		search: Search { verify_retries: 1, retry_backoff_ms: 1, ..Search::default() },
		backends: Backends::default(),
	}
}

pub fn registry(backends: Vec<Arc<dyn SearchBackend>>) -> BackendRegistry {
	let mut registry = BackendRegistry::new();

	for backend in backends {
		registry.register(backend);
	}

	registry
}

pub fn engine(
	cfg: Config,
	backends: Vec<Arc<dyn SearchBackend>>,
	planner: Arc<dyn PlannerProvider>,
	verifier: Arc<dyn VerifierProvider>,
) -> Arc<SiftEngine> {
	Arc::new(SiftEngine::with_providers(
		cfg,
		registry(backends),
		Providers { planner, verifier },
	))
}

// --- planner fakes ---

pub struct StaticPlanner {
	pub plan: PlanResult,
}

impl StaticPlanner {
	pub fn new(plan: PlanResult) -> Arc<Self> {
		Arc::new(Self { plan })
	}
}

impl PlannerProvider for StaticPlanner {
	fn plan<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<PlanResult>> {
		Box::pin(async move { Ok(self.plan.clone()) })
	}
}

pub struct FailingPlanner;

impl PlannerProvider for FailingPlanner {
	fn plan<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<PlanResult>> {
		Box::pin(async { Err(eyre!("planner endpoint unreachable")) })
	}
}

// --- verifier fake ---

/// Scripted verification outcomes keyed by item id. Unscripted items get
/// the default assessment. Tracks per-item attempt counts and the peak
/// number of concurrently running calls.
pub struct ScriptedVerifier {
	default_kind: AssessmentKind,
	by_id: HashMap<String, AssessmentKind>,
	failing_ids: HashSet<String>,
	delay: Duration,
	attempts: Mutex<HashMap<String, usize>>,
	in_flight: AtomicUsize,
	peak_in_flight: AtomicUsize,
}

impl ScriptedVerifier {
	pub fn new(default_kind: AssessmentKind) -> Arc<Self> {
		Arc::new(Self::base(default_kind))
	}

	pub fn with_script(
		default_kind: AssessmentKind,
		by_id: &[(&str, AssessmentKind)],
	) -> Arc<Self> {
		let mut verifier = Self::base(default_kind);

		verifier.by_id =
			by_id.iter().map(|(id, kind)| (id.to_string(), *kind)).collect();

		Arc::new(verifier)
	}

	pub fn failing(default_kind: AssessmentKind, failing_ids: &[&str]) -> Arc<Self> {
		let mut verifier = Self::base(default_kind);

		verifier.failing_ids = failing_ids.iter().map(|id| id.to_string()).collect();

		Arc::new(verifier)
	}

	pub fn slow(default_kind: AssessmentKind, delay: Duration) -> Arc<Self> {
		let mut verifier = Self::base(default_kind);

		verifier.delay = delay;

		Arc::new(verifier)
	}

	fn base(default_kind: AssessmentKind) -> Self {
		Self {
			default_kind,
			by_id: HashMap::new(),
			failing_ids: HashSet::new(),
			delay: Duration::ZERO,
			attempts: Mutex::new(HashMap::new()),
			in_flight: AtomicUsize::new(0),
			peak_in_flight: AtomicUsize::new(0),
		}
	}

	pub fn attempts_for(&self, id: &str) -> usize {
		let attempts = self.attempts.lock().unwrap_or_else(|err| err.into_inner());

		attempts.get(id).copied().unwrap_or(0)
	}

	pub fn peak_in_flight(&self) -> usize {
		self.peak_in_flight.load(Ordering::SeqCst)
	}

	fn assessment_for(&self, id: &str) -> AssessmentKind {
		self.by_id.get(id).copied().unwrap_or(self.default_kind)
	}
}

impl VerifierProvider for ScriptedVerifier {
	fn verify<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		item: &'a ResultItem,
		criteria: &'a [Criterion],
		_query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<ValidationResult>> {
		Box::pin(async move {
			{
				let mut attempts = self.attempts.lock().unwrap_or_else(|err| err.into_inner());

				*attempts.entry(item.id.clone()).or_insert(0) += 1;
			}

			let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;

			self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

			if !self.delay.is_zero() {
				tokio::time::sleep(self.delay).await;
			}

			self.in_flight.fetch_sub(1, Ordering::SeqCst);

			if self.failing_ids.contains(&item.id) {
				return Err(eyre!("scripted failure for {}", item.id));
			}

			let kind = self.assessment_for(&item.id);

			Ok(ValidationResult {
				criteria_assessment: criteria
					.iter()
					.map(|criterion| CriterionAssessment {
						criterion_id: criterion.id.clone(),
						assessment: kind,
						explanation: "Scripted assessment.".to_string(),
						evidence: Vec::new(),
					})
					.collect(),
				summary: format!("Scripted verdict for {}.", item.id),
			})
		})
	}
}

// --- backend fakes ---

/// Returns the same result set for every query.
pub struct StaticBackend {
	name: String,
	items: Vec<ResultItem>,
}

impl StaticBackend {
	pub fn new(name: &str, items: Vec<ResultItem>) -> Arc<Self> {
		let items = items
			.into_iter()
			.map(|mut item| {
				item.backend = name.to_string();

				item
			})
			.collect();

		Arc::new(Self { name: name.to_string(), items })
	}
}

impl SearchBackend for StaticBackend {
	fn name(&self) -> &str {
		&self.name
	}

	fn search<'a>(
		&'a self,
		_query: &'a str,
		max_results: u32,
	) -> BoxFuture<'a, sift_backends::Result<Vec<ResultItem>>> {
		Box::pin(async move {
			Ok(self.items.iter().take(max_results as usize).cloned().collect())
		})
	}

	fn fetch_document<'a>(
		&'a self,
		doc_id: &'a str,
	) -> BoxFuture<'a, sift_backends::Result<ResultItem>> {
		Box::pin(async move {
			self.items.iter().find(|item| item.id == doc_id).cloned().ok_or(
				sift_backends::Error::DocumentNotFound { doc_id: doc_id.to_string() },
			)
		})
	}

	fn health_check<'a>(&'a self) -> BoxFuture<'a, BackendHealth> {
		Box::pin(async {
			BackendHealth { status: HealthStatus::Healthy, latency_ms: 0, message: None }
		})
	}
}

/// Fails every call.
pub struct FailingBackend {
	name: String,
}

impl FailingBackend {
	pub fn new(name: &str) -> Arc<Self> {
		Arc::new(Self { name: name.to_string() })
	}
}

impl SearchBackend for FailingBackend {
	fn name(&self) -> &str {
		&self.name
	}

	fn search<'a>(
		&'a self,
		_query: &'a str,
		_max_results: u32,
	) -> BoxFuture<'a, sift_backends::Result<Vec<ResultItem>>> {
		Box::pin(async move {
			Err(sift_backends::Error::Unavailable {
				backend: self.name.clone(),
				message: "connection refused".to_string(),
			})
		})
	}

	fn fetch_document<'a>(
		&'a self,
		_doc_id: &'a str,
	) -> BoxFuture<'a, sift_backends::Result<ResultItem>> {
		Box::pin(async move {
			Err(sift_backends::Error::Unavailable {
				backend: self.name.clone(),
				message: "connection refused".to_string(),
			})
		})
	}

	fn health_check<'a>(&'a self) -> BoxFuture<'a, BackendHealth> {
		Box::pin(async move {
			BackendHealth {
				status: HealthStatus::Unhealthy,
				latency_ms: 0,
				message: Some("connection refused".to_string()),
			}
		})
	}
}
