use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{
		IntoResponse, Response,
		sse::{Event, KeepAlive, Sse},
	},
	routing::{get, post},
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;

use sift_backends::HealthStatus;
use sift_engine::{
	BatchSearchRequest, BatchSearchResponse, Error as EngineError, PlanResponse, SearchRequest,
	SearchResponse, StreamEvent,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/health", get(backend_health))
		.route("/v1/plan", post(plan))
		.route("/v1/search", post(search))
		.route("/v1/batch", post(batch))
		.route("/v1/document", post(document))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn backend_health(State(state): State<AppState>) -> Json<serde_json::Value> {
	let report = state.engine.backends.health_check_all().await;
	let all_healthy =
		report.iter().all(|(_, health)| health.status == HealthStatus::Healthy);
	let backends: serde_json::Map<String, serde_json::Value> = report
		.into_iter()
		.map(|(name, health)| (name, json!(health)))
		.collect();

	Json(json!({
		"status": if all_healthy { "ok" } else { "degraded" },
		"backends": backends,
	}))
}

async fn plan(
	State(state): State<AppState>,
	Json(payload): Json<PlanBody>,
) -> Result<Json<PlanResponse>, ApiError> {
	let response = state.engine.plan(&payload.query).await?;

	Ok(Json(response))
}

/// JSON response, or an SSE stream when `options.stream` is set.
async fn search(
	State(state): State<AppState>,
	Json(payload): Json<SearchRequest>,
) -> Result<Response, ApiError> {
	if payload.options.stream {
		let rx = state.engine.search_stream(payload);
		let stream = futures::stream::unfold(rx, |mut rx| async move {
			rx.recv().await.map(|event| (event, rx))
		})
		.map(|event| Ok::<Event, std::convert::Infallible>(sse_event(&event)));

		return Ok(Sse::new(stream).keep_alive(KeepAlive::default()).into_response());
	}

	let response: SearchResponse = state.engine.search(payload).await?;

	Ok(Json(response).into_response())
}

async fn batch(
	State(state): State<AppState>,
	Json(payload): Json<BatchSearchRequest>,
) -> Result<Json<BatchSearchResponse>, ApiError> {
	let response = state.engine.batch_search(payload).await?;

	Ok(Json(response))
}

async fn document(
	State(state): State<AppState>,
	Json(payload): Json<DocumentBody>,
) -> Result<Json<sift_domain::ResultItem>, ApiError> {
	let item = state.engine.document(&payload.backend, &payload.doc_id).await?;

	Ok(Json(item))
}

fn sse_event(event: &StreamEvent) -> Event {
	let payload = event
		.payload_json()
		.unwrap_or_else(|err| json!({ "message": err.to_string() }));

	Event::default().event(event.name()).data(payload.to_string())
}

#[derive(Debug, Deserialize)]
struct PlanBody {
	query: String,
}

#[derive(Debug, Deserialize)]
struct DocumentBody {
	backend: String,
	doc_id: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

impl From<EngineError> for ApiError {
	fn from(err: EngineError) -> Self {
		let message = err.to_string();

		match err {
			EngineError::InvalidRequest { .. } =>
				Self::new(StatusCode::BAD_REQUEST, "invalid_request", message),
			EngineError::BackendNotFound { .. } =>
				Self::new(StatusCode::NOT_FOUND, "backend_not_found", message),
			EngineError::DocumentNotFound { .. } =>
				Self::new(StatusCode::NOT_FOUND, "document_not_found", message),
			EngineError::AllBackendsUnavailable =>
				Self::new(StatusCode::SERVICE_UNAVAILABLE, "backends_unavailable", message),
			EngineError::Timeout =>
				Self::new(StatusCode::GATEWAY_TIMEOUT, "run_timeout", message),
			EngineError::Planning { .. } =>
				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "planning_failed", message),
			EngineError::Cancelled | EngineError::Provider { .. } =>
				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
