use axum::{
	body::{self, Body},
	http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use sift_api::{routes, state::AppState};
use sift_domain::AssessmentKind;
use sift_testkit::{
	FailingBackend, ScriptedVerifier, StaticBackend, StaticPlanner, criterion, engine, item, plan,
	test_config,
};

fn app() -> axum::Router {
	let engine = engine(
		test_config(),
		vec![StaticBackend::new("static", vec![item("a", "Result A"), item("b", "Result B")])],
		StaticPlanner::new(plan(&["solar forecasting"], vec![criterion("c1", 1.0)])),
		ScriptedVerifier::with_script(AssessmentKind::Support, &[("b", AssessmentKind::Reject)]),
	);

	routes::router(AppState::with_engine(engine))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(uri)
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from(body.to_string()))
		.unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
	let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();

	serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_is_ok() {
	let response = app()
		.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn backend_health_reports_every_backend() {
	let engine = engine(
		test_config(),
		vec![
			StaticBackend::new("static", vec![item("a", "Result A")]),
			FailingBackend::new("down"),
		],
		StaticPlanner::new(plan(&["q"], vec![criterion("c1", 1.0)])),
		ScriptedVerifier::new(AssessmentKind::Support),
	);
	let app = routes::router(AppState::with_engine(engine));

	let response = app
		.oneshot(Request::builder().uri("/v1/health").body(Body::empty()).unwrap())
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::OK);

	let body = body_json(response).await;

	assert_eq!(body["status"], "degraded");
	assert_eq!(body["backends"]["static"]["status"], "healthy");
	assert_eq!(body["backends"]["down"]["status"], "unhealthy");
}

#[tokio::test]
async fn search_returns_classified_buckets() {
	let response = app()
		.oneshot(post_json("/v1/search", json!({ "query": "solar forecasting" })))
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::OK);

	let body = body_json(response).await;

	assert_eq!(body["status"], "completed");
	assert_eq!(body["total_scanned"], 2);
	assert_eq!(body["perfect_results"][0]["result"]["id"], "a");
	assert_eq!(body["rejected_count"], 1);
}

#[tokio::test]
async fn empty_query_maps_to_bad_request() {
	let response =
		app().oneshot(post_json("/v1/search", json!({ "query": "  " }))).await.unwrap();

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let body = body_json(response).await;

	assert_eq!(body["error_code"], "invalid_request");
}

#[tokio::test]
async fn unknown_backend_maps_to_not_found() {
	let request = post_json(
		"/v1/search",
		json!({ "query": "solar forecasting", "options": { "backends": ["nope"] } }),
	);
	let response = app().oneshot(request).await.unwrap();

	assert_eq!(response.status(), StatusCode::NOT_FOUND);

	let body = body_json(response).await;

	assert_eq!(body["error_code"], "backend_not_found");
}

#[tokio::test]
async fn streaming_search_frames_server_sent_events() {
	let request = post_json(
		"/v1/search",
		json!({ "query": "solar forecasting", "options": { "stream": true } }),
	);
	let response = app().oneshot(request).await.unwrap();

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(
		response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
		"text/event-stream"
	);

	let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
	let text = String::from_utf8(bytes.to_vec()).unwrap();

	assert!(text.contains("event: plan"));
	assert!(text.contains("event: search_ready"));
	assert!(text.contains("event: result"));
	assert!(text.contains("event: done"));
	assert!(!text.contains("event: error"));
}

#[tokio::test]
async fn plan_endpoint_returns_the_plan() {
	let response =
		app().oneshot(post_json("/v1/plan", json!({ "query": "solar forecasting" }))).await.unwrap();

	assert_eq!(response.status(), StatusCode::OK);

	let body = body_json(response).await;

	assert_eq!(body["plan"]["search_queries"][0], "solar forecasting");
	assert_eq!(body["plan"]["criteria"][0]["id"], "c1");
}

#[tokio::test]
async fn batch_endpoint_runs_every_query() {
	let request = post_json(
		"/v1/batch",
		json!({ "queries": ["solar forecasting", "wind forecasting"], "export_format": "csv" }),
	);
	let response = app().oneshot(request).await.unwrap();

	assert_eq!(response.status(), StatusCode::OK);

	let body = body_json(response).await;

	assert_eq!(body["results"].as_array().unwrap().len(), 2);
	assert!(body["export"].as_str().unwrap().starts_with("query,classification"));
}

#[tokio::test]
async fn document_endpoint_fetches_and_maps_missing() {
	let found = app()
		.oneshot(post_json("/v1/document", json!({ "backend": "static", "doc_id": "a" })))
		.await
		.unwrap();

	assert_eq!(found.status(), StatusCode::OK);
	assert_eq!(body_json(found).await["id"], "a");

	let missing = app()
		.oneshot(post_json("/v1/document", json!({ "backend": "static", "doc_id": "zzz" })))
		.await
		.unwrap();

	assert_eq!(missing.status(), StatusCode::NOT_FOUND);
	assert_eq!(body_json(missing).await["error_code"], "document_not_found");
}
