use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc::Receiver;

use sift_domain::{AssessmentKind, PlanResult};
use sift_engine::{
	Error, ResultPayload, RunStatus, SearchOptions, SearchRequest, SiftEngine, StreamEvent,
};
use sift_testkit::{
	FailingBackend, FailingPlanner, ScriptedVerifier, StaticBackend, StaticPlanner, criterion,
	engine, item, plan, test_config,
};

fn request(query: &str) -> SearchRequest {
	SearchRequest { query: query.to_string(), options: SearchOptions::default() }
}

fn one_criterion_plan() -> PlanResult {
	plan(&["solar forecasting"], vec![criterion("c1", 1.0)])
}

fn three_item_backend() -> Arc<StaticBackend> {
	StaticBackend::new(
		"static",
		vec![item("a", "Result A"), item("b", "Result B"), item("c", "Result C")],
	)
}

async fn drain(mut rx: Receiver<StreamEvent>) -> Vec<StreamEvent> {
	let mut events = Vec::new();

	while let Some(event) = rx.recv().await {
		events.push(event);
	}

	events
}

#[tokio::test]
async fn completed_run_buckets_by_classification() {
	let verifier = ScriptedVerifier::with_script(
		AssessmentKind::Support,
		&[("b", AssessmentKind::Reject), ("c", AssessmentKind::SomewhatSupport)],
	);
	let engine = engine(
		test_config(),
		vec![three_item_backend()],
		StaticPlanner::new(one_criterion_plan()),
		verifier,
	);

	let response = engine.search(request("solar forecasting")).await.unwrap();

	assert_eq!(response.status, RunStatus::Completed);
	assert_eq!(response.total_scanned, 3);
	assert_eq!(response.perfect_results.len(), 1);
	assert_eq!(response.perfect_results[0].result.id, "a");
	assert_eq!(response.partial_results.len(), 1);
	assert_eq!(response.partial_results[0].result.id, "c");
	assert_eq!(response.rejected_count, 1);
	assert!(response.plan.is_some());
	assert!(response.error.is_none());
}

#[tokio::test]
async fn one_failing_backend_degrades_not_fails() {
	let engine = engine(
		test_config(),
		vec![three_item_backend(), FailingBackend::new("down")],
		StaticPlanner::new(one_criterion_plan()),
		ScriptedVerifier::new(AssessmentKind::Support),
	);

	let response = engine.search(request("solar forecasting")).await.unwrap();

	assert_eq!(response.status, RunStatus::CompletedWithErrors);
	assert_eq!(response.total_scanned, 3);
	assert_eq!(response.backend_errors.len(), 1);
	assert_eq!(response.backend_errors[0].backend, "down");
}

#[tokio::test]
async fn all_backends_failing_is_fatal() {
	let engine = engine(
		test_config(),
		vec![FailingBackend::new("down-1"), FailingBackend::new("down-2")],
		StaticPlanner::new(one_criterion_plan()),
		ScriptedVerifier::new(AssessmentKind::Support),
	);

	let outcome = engine.search(request("solar forecasting")).await;

	assert!(matches!(outcome, Err(Error::AllBackendsUnavailable)));
}

#[tokio::test]
async fn empty_search_yields_no_results_status() {
	let engine = engine(
		test_config(),
		vec![StaticBackend::new("static", Vec::new())],
		StaticPlanner::new(one_criterion_plan()),
		ScriptedVerifier::new(AssessmentKind::Support),
	);

	let response = engine.search(request("solar forecasting")).await.unwrap();

	assert_eq!(response.status, RunStatus::NoResults);
	assert_eq!(response.total_scanned, 0);
	assert!(response.perfect_results.is_empty());
	assert!(response.partial_results.is_empty());
}

#[tokio::test]
async fn plan_without_criteria_is_a_planning_error() {
	let engine = engine(
		test_config(),
		vec![three_item_backend()],
		StaticPlanner::new(plan(&["q"], Vec::new())),
		ScriptedVerifier::new(AssessmentKind::Support),
	);

	let outcome = engine.search(request("solar forecasting")).await;

	assert!(matches!(outcome, Err(Error::Planning { .. })));
}

#[tokio::test]
async fn planner_failure_falls_back_to_heuristic_plan() {
	let engine = engine(
		test_config(),
		vec![three_item_backend()],
		Arc::new(FailingPlanner),
		ScriptedVerifier::new(AssessmentKind::Support),
	);

	let response = engine.search(request("deep learning solar forecasting")).await.unwrap();
	let used_plan = response.plan.unwrap();

	assert_eq!(response.status, RunStatus::Completed);
	assert_eq!(used_plan.criteria.len(), 1);
	assert!(!used_plan.search_queries.is_empty());
}

#[tokio::test]
async fn retry_exhaustion_degrades_single_item() {
	let verifier = ScriptedVerifier::failing(AssessmentKind::Support, &["bad"]);
	let backend = StaticBackend::new("static", vec![item("good", "Good"), item("bad", "Bad")]);
	let engine = engine(
		// verify_retries is 1 here, so two attempts per failing item.
		test_config(),
		vec![backend],
		StaticPlanner::new(one_criterion_plan()),
		verifier.clone(),
	);

	let response = engine.search(request("solar forecasting")).await.unwrap();

	assert_eq!(verifier.attempts_for("bad"), 2);
	assert_eq!(response.status, RunStatus::Completed);
	assert_eq!(response.perfect_results.len(), 1);
	assert_eq!(response.perfect_results[0].result.id, "good");
	// The failed item degrades to an all-insufficient partial.
	assert_eq!(response.partial_results.len(), 1);
	assert_eq!(response.partial_results[0].result.id, "bad");
	assert!((response.partial_results[0].weighted_score - 0.25).abs() < 1e-6);
}

#[tokio::test]
async fn in_flight_verifications_stay_within_pool() {
	let mut cfg = test_config();

	cfg.search.verify_workers = 2;

	let verifier = ScriptedVerifier::slow(AssessmentKind::Support, Duration::from_millis(20));
	let items = (0..8).map(|n| item(&format!("doc-{n}"), "Doc")).collect();
	let engine = engine(
		cfg,
		vec![StaticBackend::new("static", items)],
		StaticPlanner::new(one_criterion_plan()),
		verifier.clone(),
	);

	let response = engine.search(request("solar forecasting")).await.unwrap();

	assert_eq!(response.total_scanned, 8);
	assert!(verifier.peak_in_flight() <= 2, "peak was {}", verifier.peak_in_flight());
}

#[tokio::test]
async fn verify_off_substitutes_sentinel_validations() {
	let verifier = ScriptedVerifier::new(AssessmentKind::Support);
	let engine = engine(
		test_config(),
		vec![three_item_backend()],
		StaticPlanner::new(one_criterion_plan()),
		verifier.clone(),
	);
	let request = SearchRequest {
		query: "solar forecasting".to_string(),
		options: SearchOptions { verify: false, ..SearchOptions::default() },
	};

	let response = engine.search(request).await.unwrap();

	assert_eq!(verifier.attempts_for("a"), 0);
	assert_eq!(response.status, RunStatus::Completed);
	// All-insufficient sentinels classify as partial.
	assert_eq!(response.partial_results.len(), 3);
	assert!(response.perfect_results.is_empty());
}

#[tokio::test]
async fn classify_off_passes_raw_results_through() {
	let engine = engine(
		test_config(),
		vec![three_item_backend()],
		StaticPlanner::new(one_criterion_plan()),
		ScriptedVerifier::new(AssessmentKind::Support),
	);
	let request = SearchRequest {
		query: "solar forecasting".to_string(),
		options: SearchOptions { classify: false, ..SearchOptions::default() },
	};

	let response = engine.search(request).await.unwrap();

	assert_eq!(response.raw_results.len(), 3);
	assert!(response.perfect_results.is_empty());
	assert!(response.partial_results.is_empty());
	assert_eq!(response.rejected_count, 0);
	// Raw bucket is still ordered by scan index.
	let indexes: Vec<usize> = response.raw_results.iter().map(|raw| raw.index).collect();

	assert_eq!(indexes, vec![0, 1, 2]);
}

#[tokio::test]
async fn merge_order_is_query_then_backend_then_rank() {
	let alpha = StaticBackend::new("alpha", vec![item("a1", "A1"), item("a2", "A2")]);
	let beta = StaticBackend::new("beta", vec![item("b1", "B1")]);
	let engine = engine(
		test_config(),
		vec![alpha, beta],
		StaticPlanner::new(one_criterion_plan()),
		ScriptedVerifier::new(AssessmentKind::Support),
	);

	let response = engine.search(request("solar forecasting")).await.unwrap();
	let ids: Vec<&str> =
		response.perfect_results.iter().map(|scored| scored.result.id.as_str()).collect();

	assert_eq!(ids, ["a1", "a2", "b1"]);
}

#[tokio::test]
async fn merged_results_are_capped_at_max_results() {
	// Two generated queries against a three-item backend would merge six
	// fetches; the cap applies to the merged list, not just per backend.
	let engine = engine(
		test_config(),
		vec![three_item_backend()],
		StaticPlanner::new(plan(
			&["solar forecasting", "pv output prediction"],
			vec![criterion("c1", 1.0)],
		)),
		ScriptedVerifier::new(AssessmentKind::Support),
	);
	let request = SearchRequest {
		query: "solar forecasting".to_string(),
		options: SearchOptions { max_results: 2, ..SearchOptions::default() },
	};

	let response = engine.search(request).await.unwrap();

	assert_eq!(response.status, RunStatus::Completed);
	assert_eq!(response.total_scanned, 2);
	assert_eq!(response.perfect_results.len(), 2);
}

#[tokio::test]
async fn streaming_emits_the_full_event_vocabulary() {
	let engine = engine(
		test_config(),
		vec![three_item_backend()],
		StaticPlanner::new(one_criterion_plan()),
		ScriptedVerifier::new(AssessmentKind::Support),
	);

	let events = drain(engine.search_stream(request("solar forecasting"))).await;

	assert!(matches!(events[0], StreamEvent::Plan { .. }));
	assert!(matches!(events[1], StreamEvent::SearchReady { total: 3, .. }));

	let result_events: Vec<&StreamEvent> = events
		.iter()
		.filter(|event| matches!(event, StreamEvent::Result { .. }))
		.collect();

	assert_eq!(result_events.len(), 3);

	let mut indexes: Vec<usize> = result_events
		.iter()
		.map(|event| match event {
			StreamEvent::Result { payload: ResultPayload::Scored(scored), .. } => scored.index,
			_ => unreachable!(),
		})
		.collect();

	indexes.sort_unstable();

	// Emission is completion order, but every scan index appears once.
	assert_eq!(indexes, vec![0, 1, 2]);

	match events.last() {
		Some(StreamEvent::Done { summary }) => {
			assert_eq!(summary.status, RunStatus::Completed);
			assert_eq!(summary.counts.total_scanned, 3);
		},
		other => panic!("expected terminal done event, got {other:?}"),
	}
}

#[tokio::test]
async fn dropped_consumer_cancels_the_run() {
	let verifier = ScriptedVerifier::slow(AssessmentKind::Support, Duration::from_millis(200));
	let engine = engine(
		test_config(),
		vec![three_item_backend()],
		StaticPlanner::new(one_criterion_plan()),
		verifier.clone(),
	);

	let mut rx = engine.search_stream(request("solar forecasting"));

	assert!(matches!(rx.recv().await, Some(StreamEvent::Plan { .. })));
	assert!(matches!(rx.recv().await, Some(StreamEvent::SearchReady { .. })));
	drop(rx);

	// Give the run time to notice the closed channel and abort.
	tokio::time::sleep(Duration::from_millis(400)).await;

	// No item was verified more than once and the run stopped quietly.
	for id in ["a", "b", "c"] {
		assert!(verifier.attempts_for(id) <= 1);
	}
}

#[tokio::test]
async fn deadline_terminates_with_partial_output() {
	let verifier = ScriptedVerifier::slow(AssessmentKind::Support, Duration::from_millis(500));
	let engine = engine(
		test_config(),
		vec![three_item_backend()],
		StaticPlanner::new(one_criterion_plan()),
		verifier,
	);
	let request = SearchRequest {
		query: "solar forecasting".to_string(),
		options: SearchOptions { timeout_ms: Some(50), ..SearchOptions::default() },
	};

	let response = engine.search(request).await.unwrap();

	assert_eq!(response.status, RunStatus::Failed);
	assert!(response.error.is_some());
	assert_eq!(response.total_scanned, 3);
	assert!(response.perfect_results.is_empty());
}

#[tokio::test]
async fn streaming_deadline_ends_with_error_event() {
	let verifier = ScriptedVerifier::slow(AssessmentKind::Support, Duration::from_millis(500));
	let engine = engine(
		test_config(),
		vec![three_item_backend()],
		StaticPlanner::new(one_criterion_plan()),
		verifier,
	);
	let request = SearchRequest {
		query: "solar forecasting".to_string(),
		options: SearchOptions { timeout_ms: Some(50), ..SearchOptions::default() },
	};

	let events = drain(engine.search_stream(request)).await;

	assert!(!events.iter().any(|event| matches!(event, StreamEvent::Done { .. })));

	match events.last() {
		Some(StreamEvent::Error { summary: Some(summary), .. }) => {
			assert_eq!(summary.status, RunStatus::Failed);
		},
		other => panic!("expected terminal error event, got {other:?}"),
	}
}

#[tokio::test]
async fn batch_mixes_successes_and_per_query_stubs() {
	let engine = engine(
		test_config(),
		vec![three_item_backend()],
		StaticPlanner::new(one_criterion_plan()),
		ScriptedVerifier::new(AssessmentKind::Support),
	);
	let request = sift_engine::BatchSearchRequest {
		queries: vec!["solar forecasting".to_string(), "  ".to_string()],
		options: SearchOptions::default(),
		export_format: Some(sift_engine::ExportFormat::Csv),
	};

	let batch = engine.batch_search(request).await.unwrap();

	assert_eq!(batch.results.len(), 2);
	assert_eq!(batch.results[0].status, RunStatus::Completed);
	assert_eq!(batch.results[1].status, RunStatus::Failed);
	assert!(batch.results[1].error.as_deref().unwrap_or("").contains("Invalid request"));

	let export = batch.export.unwrap();

	assert!(export.starts_with("query,classification,weighted_score"));
	assert!(export.contains("Result A"));
}

#[tokio::test]
async fn empty_batch_is_invalid() {
	let engine = engine(
		test_config(),
		vec![three_item_backend()],
		StaticPlanner::new(one_criterion_plan()),
		ScriptedVerifier::new(AssessmentKind::Support),
	);
	let request = sift_engine::BatchSearchRequest {
		queries: Vec::new(),
		options: SearchOptions::default(),
		export_format: None,
	};

	assert!(matches!(engine.batch_search(request).await, Err(Error::InvalidRequest { .. })));
}

#[tokio::test]
async fn document_fetch_maps_backend_errors() {
	let engine = engine(
		test_config(),
		vec![three_item_backend()],
		StaticPlanner::new(one_criterion_plan()),
		ScriptedVerifier::new(AssessmentKind::Support),
	);

	assert_eq!(engine.document("static", "a").await.unwrap().id, "a");
	assert!(matches!(
		engine.document("static", "zzz").await,
		Err(Error::DocumentNotFound { .. })
	));
	assert!(matches!(
		engine.document("unknown", "a").await,
		Err(Error::BackendNotFound { .. })
	));
}

#[tokio::test]
async fn plan_only_mode_reports_the_plan() {
	let engine: Arc<SiftEngine> = engine(
		test_config(),
		vec![three_item_backend()],
		StaticPlanner::new(one_criterion_plan()),
		ScriptedVerifier::new(AssessmentKind::Support),
	);

	let response = engine.plan("solar forecasting").await.unwrap();

	assert!(response.request_id.starts_with("plan_"));
	assert_eq!(response.plan.search_queries, vec!["solar forecasting".to_string()]);

	assert!(matches!(engine.plan("   ").await, Err(Error::InvalidRequest { .. })));
}
