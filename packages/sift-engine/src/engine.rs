use std::{
	collections::HashSet,
	sync::Arc,
	time::Duration,
};

use tokio::{
	sync::{Semaphore, mpsc},
	task::JoinSet,
	time::{Instant, sleep, timeout_at},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use sift_backends::SearchBackend;
use sift_config::LlmProviderConfig;
use sift_domain::{
	Aggregator, Criterion, PlanResult, RawVerifiedResult, ResultItem, ValidationResult,
	fallback_validation, score_result,
};
use sift_providers::planner::fallback_plan;

use crate::{
	Error, Result, SiftEngine, VerifierProvider,
	events::{ResultPayload, StreamEvent},
	request::{BatchSearchRequest, ExportFormat, SearchOptions, SearchRequest},
	response::{
		BackendError, BatchSearchResponse, PlanResponse, RunStatus, RunSummary, SearchResponse,
	},
};

/// Batch mode carries no sender; every emit is a no-op. In streaming mode a
/// failed send means the consumer went away, which cancels the run.
struct EventSink {
	tx: Option<mpsc::Sender<StreamEvent>>,
}

impl EventSink {
	fn batch() -> Self {
		Self { tx: None }
	}

	fn streaming(tx: mpsc::Sender<StreamEvent>) -> Self {
		Self { tx: Some(tx) }
	}

	fn is_streaming(&self) -> bool {
		self.tx.is_some()
	}

	async fn emit(&self, event: StreamEvent) -> Result<()> {
		if let Some(tx) = &self.tx {
			tx.send(event).await.map_err(|_| Error::Cancelled)?;
		}

		Ok(())
	}
}

fn request_id(prefix: &str) -> String {
	let id = Uuid::new_v4().simple().to_string();

	format!("{prefix}_{}", &id[..12])
}

impl SiftEngine {
	/// Planning stage only. Useful for inspecting what a query would run.
	pub async fn plan(&self, query: &str) -> Result<PlanResponse> {
		let query = query.trim();

		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "Query must not be empty.".to_string() });
		}

		let started = Instant::now();
		let plan = self.plan_stage(query, true).await?;

		Ok(PlanResponse {
			request_id: request_id("plan"),
			query: query.to_string(),
			plan,
			processing_time_ms: started.elapsed().as_millis() as u64,
		})
	}

	/// Run the full pipeline and return everything at once.
	pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse> {
		self.run(request, &EventSink::batch()).await
	}

	/// Run the full pipeline, forwarding events as they are produced. The
	/// returned receiver closing cancels the run; in-flight verification
	/// tasks are aborted.
	pub fn search_stream(self: &Arc<Self>, request: SearchRequest) -> mpsc::Receiver<StreamEvent> {
		let (tx, rx) = mpsc::channel(self.cfg.search.stream_buffer as usize);
		let engine = self.clone();

		tokio::spawn(async move {
			let sink = EventSink::streaming(tx.clone());

			match engine.run(request, &sink).await {
				Ok(_) | Err(Error::Cancelled) => {},
				Err(err) => {
					let _ = tx
						.send(StreamEvent::Error { message: err.to_string(), summary: None })
						.await;
				},
			}
		});

		rx
	}

	/// Run every query through its own full pipeline, concurrently. A failed
	/// query becomes a stub entry; the batch itself only fails on an invalid
	/// request.
	pub async fn batch_search(
		self: &Arc<Self>,
		request: BatchSearchRequest,
	) -> Result<BatchSearchResponse> {
		if request.queries.is_empty() {
			return Err(Error::InvalidRequest {
				message: "Batch must contain at least one query.".to_string(),
			});
		}

		let started = Instant::now();
		let mut tasks = JoinSet::new();

		for (slot, query) in request.queries.iter().enumerate() {
			let engine = self.clone();
			let search_request =
				SearchRequest { query: query.clone(), options: request.options.clone() };

			tasks.spawn(async move { (slot, engine.search(search_request).await) });
		}

		let mut results: Vec<Option<SearchResponse>> = Vec::new();

		results.resize_with(request.queries.len(), || None);

		while let Some(joined) = tasks.join_next().await {
			let Ok((slot, outcome)) = joined else {
				continue;
			};

			results[slot] = Some(match outcome {
				Ok(response) => response,
				Err(err) => SearchResponse::failed_stub(
					request_id("req"),
					&request.queries[slot],
					err.to_string(),
				),
			});
		}

		let results: Vec<SearchResponse> = results
			.into_iter()
			.zip(&request.queries)
			.map(|(slot, query)| {
				slot.unwrap_or_else(|| {
					SearchResponse::failed_stub(
						request_id("req"),
						query,
						"Query task failed to complete.".to_string(),
					)
				})
			})
			.collect();
		let export = match request.export_format {
			Some(ExportFormat::Csv) => Some(crate::export::to_csv(&results)),
			Some(ExportFormat::Json) => Some(
				crate::export::to_json(&results)
					.map_err(|err| Error::Provider { message: err.to_string() })?,
			),
			None => None,
		};

		Ok(BatchSearchResponse {
			request_id: request_id("batch"),
			results,
			processing_time_ms: started.elapsed().as_millis() as u64,
			export,
		})
	}

	/// Fetch one document from a named backend, bypassing the pipeline.
	pub async fn document(&self, backend: &str, doc_id: &str) -> Result<ResultItem> {
		let backend = self.backends.get(backend)?;

		Ok(backend.fetch_document(doc_id).await?)
	}

	async fn run(&self, request: SearchRequest, sink: &EventSink) -> Result<SearchResponse> {
		let query = request.query.trim().to_string();

		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "Query must not be empty.".to_string() });
		}

		let opts = request.options;
		let started = Instant::now();
		let deadline = started
			+ Duration::from_millis(opts.timeout_ms.unwrap_or(self.cfg.search.run_timeout_ms));
		let id = request_id("req");

		info!(request_id = %id, %query, "Starting run.");

		// Stage 1: plan. Failure here is fatal, nothing downstream can run.
		let plan = timeout_at(deadline, self.plan_stage(&query, opts.decompose))
			.await
			.map_err(|_| Error::Timeout)??;

		if plan.criteria.is_empty() {
			return Err(Error::Planning {
				message: "Planner produced no screening criteria.".to_string(),
			});
		}

		sink.emit(StreamEvent::Plan { plan: plan.clone() }).await?;

		// Stage 2: fan out one search per (query, backend) pair. Request
		// selection wins over the configured default set.
		let requested = opts.backends.as_deref().or_else(|| {
			(!self.cfg.search.default_backends.is_empty())
				.then_some(self.cfg.search.default_backends.as_slice())
		});
		let backends = self.backends.select(requested)?;

		if backends.is_empty() {
			return Err(Error::AllBackendsUnavailable);
		}

		let (mut items, backend_errors) = timeout_at(
			deadline,
			self.search_stage(&backends, &plan.search_queries, opts.max_results),
		)
		.await
		.map_err(|_| Error::Timeout)?;

		if items.is_empty() && !backend_errors.is_empty() {
			let failed: HashSet<&str> =
				backend_errors.iter().map(|err| err.backend.as_str()).collect();

			if backends.iter().all(|backend| failed.contains(backend.name())) {
				return Err(Error::AllBackendsUnavailable);
			}
		}

		// The per-backend limit bounds each fetch; the merged list still has
		// to honor the requested cap overall.
		items.truncate(opts.max_results as usize);

		let total = items.len();

		if sink.is_streaming() {
			sink.emit(StreamEvent::SearchReady { total, results: items.clone() }).await?;
		}
		debug!(request_id = %id, total, "Search stage merged.");

		// Stages 3-5: verify, classify, aggregate through one funnel.
		let mut aggregator = Aggregator::new();
		let timed_out = if opts.verify {
			self.verify_stage(&query, &opts, &plan, items, deadline, sink, &mut aggregator)
				.await?
		} else {
			// Sentinel validations, no provider calls.
			for (index, item) in items.into_iter().enumerate() {
				let validation = fallback_validation(&plan.criteria);

				record_and_emit(
					&mut aggregator,
					sink,
					&opts,
					&plan.criteria,
					index + 1,
					total,
					index,
					item,
					validation,
				)
				.await?;
			}

			false
		};

		// Finalize.
		let counts = aggregator.counts();
		let status = if timed_out {
			RunStatus::Failed
		} else if total == 0 {
			RunStatus::NoResults
		} else if backend_errors.is_empty() {
			RunStatus::Completed
		} else {
			RunStatus::CompletedWithErrors
		};
		let processing_time_ms = started.elapsed().as_millis() as u64;
		let summary = RunSummary {
			status,
			counts,
			processing_time_ms,
			backend_errors: backend_errors.clone(),
		};

		if timed_out {
			sink.emit(StreamEvent::Error {
				message: Error::Timeout.to_string(),
				summary: Some(summary),
			})
			.await?;
		} else {
			sink.emit(StreamEvent::Done { summary }).await?;
		}

		let buckets = aggregator.finish();

		info!(request_id = %id, ?status, total, "Run finished.");

		Ok(SearchResponse {
			request_id: id,
			query,
			status,
			processing_time_ms,
			plan: Some(plan),
			perfect_results: buckets.perfect,
			partial_results: buckets.partial,
			rejected_count: buckets.rejected.len(),
			raw_results: buckets.raw,
			total_scanned: total,
			backend_errors,
			error: timed_out.then(|| Error::Timeout.to_string()),
		})
	}

	/// Ask the planner to decompose the query. Provider failure degrades to
	/// the heuristic plan rather than failing the run; `decompose == false`
	/// goes straight to the heuristic.
	async fn plan_stage(&self, query: &str, decompose: bool) -> Result<PlanResult> {
		if !decompose {
			return Ok(fallback_plan(query));
		}

		match self.providers.planner.plan(&self.cfg.providers.planner, query).await {
			Ok(plan) => Ok(plan),
			Err(err) => {
				warn!(error = %err, "Planner unavailable, using heuristic plan.");

				Ok(fallback_plan(query))
			},
		}
	}

	/// One search per (generated query, backend) pair, all concurrent. The
	/// merged list is ordered by query position, then backend registration
	/// order, then backend rank. No cross-backend deduplication.
	async fn search_stage(
		&self,
		backends: &[Arc<dyn SearchBackend>],
		queries: &[String],
		max_results: u32,
	) -> (Vec<ResultItem>, Vec<BackendError>) {
		let width = backends.len();
		let mut tasks = JoinSet::new();

		for (query_pos, query) in queries.iter().enumerate() {
			for (backend_pos, backend) in backends.iter().enumerate() {
				let backend = backend.clone();
				let query = query.clone();

				tasks.spawn(async move {
					let outcome = backend.search(&query, max_results).await;

					(query_pos, backend_pos, backend.name().to_string(), outcome)
				});
			}
		}

		let mut slots: Vec<Vec<ResultItem>> = Vec::new();

		slots.resize_with(queries.len() * width, Vec::new);

		let mut errors = Vec::new();

		while let Some(joined) = tasks.join_next().await {
			match joined {
				Ok((query_pos, backend_pos, _, Ok(found))) => {
					slots[query_pos * width + backend_pos] = found;
				},
				Ok((_, _, backend, Err(err))) => {
					warn!(%backend, error = %err, "Backend search failed.");
					errors.push(BackendError { backend, message: err.to_string() });
				},
				Err(err) => warn!(error = %err, "Search task failed."),
			}
		}

		// Deterministic across runs even though errors arrive in completion
		// order.
		errors.sort();

		(slots.into_iter().flatten().collect(), errors)
	}

	/// The concurrency core. Every item is spawned up front; a semaphore
	/// bounds in-flight verification calls to the configured pool size, and
	/// completions funnel through this single loop for classification and
	/// aggregation.
	#[allow(clippy::too_many_arguments)]
	async fn verify_stage(
		&self,
		query: &str,
		opts: &SearchOptions,
		plan: &PlanResult,
		items: Vec<ResultItem>,
		deadline: Instant,
		sink: &EventSink,
		aggregator: &mut Aggregator,
	) -> Result<bool> {
		let total = items.len();
		let semaphore = Arc::new(Semaphore::new(self.cfg.search.verify_workers as usize));
		let criteria = Arc::new(plan.criteria.clone());
		let retries = self.cfg.search.verify_retries;
		let backoff_ms = self.cfg.search.retry_backoff_ms;
		let mut tasks = JoinSet::new();

		for (index, item) in items.into_iter().enumerate() {
			let semaphore = semaphore.clone();
			let verifier = self.providers.verifier.clone();
			let cfg = self.cfg.providers.verifier.clone();
			let criteria = criteria.clone();
			let query = query.to_string();

			tasks.spawn(async move {
				let Ok(_permit) = semaphore.acquire_owned().await else {
					// Semaphore closed only happens on teardown.
					return (index, item, fallback_validation(&criteria));
				};
				let validation = verify_with_retry(
					verifier.as_ref(),
					&cfg,
					&item,
					&criteria,
					&query,
					retries,
					backoff_ms,
				)
				.await;

				(index, item, validation)
			});
		}

		let mut sequence = 0;
		let timed_out = loop {
			let joined = match timeout_at(deadline, tasks.join_next()).await {
				Ok(Some(joined)) => joined,
				Ok(None) => break false,
				Err(_) => break true,
			};
			let (index, item, validation) = match joined {
				Ok(output) => output,
				Err(err) => {
					warn!(error = %err, "Verification task failed.");

					continue;
				},
			};

			sequence += 1;

			record_and_emit(
				aggregator,
				sink,
				opts,
				&plan.criteria,
				sequence,
				total,
				index,
				item,
				validation,
			)
			.await?;
		};

		// Dropping the set aborts whatever is still in flight after a
		// deadline hit.
		drop(tasks);

		Ok(timed_out)
	}
}

/// Classify (or pass through raw), hand to the aggregator, and emit the
/// per-item event. Emission order is completion order; the payload carries
/// the original scan index.
#[allow(clippy::too_many_arguments)]
async fn record_and_emit(
	aggregator: &mut Aggregator,
	sink: &EventSink,
	opts: &SearchOptions,
	criteria: &[Criterion],
	sequence: usize,
	total: usize,
	index: usize,
	item: ResultItem,
	validation: ValidationResult,
) -> Result<()> {
	let payload = if opts.classify {
		let scored = score_result(index, item, validation, criteria);

		aggregator.record(scored.clone());

		ResultPayload::Scored(scored)
	} else {
		let raw = RawVerifiedResult { index, result: item, validation };

		aggregator.record_raw(raw.clone());

		ResultPayload::Raw(raw)
	};

	sink.emit(StreamEvent::Result { sequence, total, payload }).await
}

/// Per-item verification with bounded retry. Exhaustion degrades to the
/// all-insufficient sentinel; a single item never fails the run.
async fn verify_with_retry(
	verifier: &dyn VerifierProvider,
	cfg: &LlmProviderConfig,
	item: &ResultItem,
	criteria: &[Criterion],
	query: &str,
	retries: u32,
	backoff_ms: u64,
) -> ValidationResult {
	for attempt in 0..=retries {
		match verifier.verify(cfg, item, criteria, query).await {
			Ok(validation) => return validation,
			Err(err) => {
				warn!(item = %item.id, attempt, error = %err, "Verification attempt failed.");

				if attempt < retries {
					sleep(Duration::from_millis(backoff_ms << attempt)).await;
				}
			},
		}
	}

	fallback_validation(criteria)
}
