//! Meilisearch backend adapter.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::{Map, Value};

use sift_config::MeilisearchBackend;
use sift_domain::ResultItem;

use crate::{BackendHealth, BoxFuture, Error, HealthStatus, Result, SearchBackend};

pub struct Meilisearch {
	base_url: String,
	index: String,
	api_key: Option<String>,
	client: Client,
}

impl Meilisearch {
	pub fn new(cfg: &MeilisearchBackend) -> Result<Self> {
		let client =
			Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self {
			base_url: cfg.url.trim_end_matches('/').to_string(),
			index: cfg.index.clone(),
			api_key: cfg.api_key.clone(),
			client,
		})
	}

	fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
		let builder = self.client.request(method, url);

		match &self.api_key {
			Some(key) => builder.bearer_auth(key),
			None => builder,
		}
	}
}

impl SearchBackend for Meilisearch {
	fn name(&self) -> &str {
		"meilisearch"
	}

	fn search<'a>(
		&'a self,
		query: &'a str,
		max_results: u32,
	) -> BoxFuture<'a, Result<Vec<ResultItem>>> {
		Box::pin(async move {
			let url = format!("{}/indexes/{}/search", self.base_url, self.index);
			let body = serde_json::json!({ "q": query, "limit": max_results });
			let res = self
				.request(reqwest::Method::POST, url)
				.json(&body)
				.send()
				.await
				.map_err(|err| Error::from_transport("meilisearch", err))?
				.error_for_status()
				.map_err(|err| Error::from_transport("meilisearch", err))?;
			let json: Value = res.json().await?;
			let hits = json
				.get("hits")
				.and_then(|v| v.as_array())
				.cloned()
				.unwrap_or_default();

			Ok(hits.iter().map(map_hit).collect())
		})
	}

	fn fetch_document<'a>(&'a self, doc_id: &'a str) -> BoxFuture<'a, Result<ResultItem>> {
		Box::pin(async move {
			let url =
				format!("{}/indexes/{}/documents/{doc_id}", self.base_url, self.index);
			let res = self
				.request(reqwest::Method::GET, url)
				.send()
				.await
				.map_err(|err| Error::from_transport("meilisearch", err))?;

			if res.status() == reqwest::StatusCode::NOT_FOUND {
				return Err(Error::DocumentNotFound { doc_id: doc_id.to_string() });
			}

			let json: Value = res
				.error_for_status()
				.map_err(|err| Error::from_transport("meilisearch", err))?
				.json()
				.await?;

			Ok(map_hit(&json))
		})
	}

	fn health_check<'a>(&'a self) -> BoxFuture<'a, BackendHealth> {
		Box::pin(async move {
			let started = Instant::now();
			let url = format!("{}/health", self.base_url);
			let outcome = self.request(reqwest::Method::GET, url).send().await;
			let latency_ms = started.elapsed().as_millis() as u64;

			match outcome {
				Ok(res) if res.status().is_success() => {
					BackendHealth { status: HealthStatus::Healthy, latency_ms, message: None }
				},
				Ok(res) => BackendHealth {
					status: HealthStatus::Degraded,
					latency_ms,
					message: Some(format!("Health endpoint returned {}.", res.status())),
				},
				Err(err) => BackendHealth {
					status: HealthStatus::Unhealthy,
					latency_ms,
					message: Some(err.to_string()),
				},
			}
		})
	}
}

/// Map one Meilisearch hit to the normalized item shape. Common fields are
/// lifted out; everything else rides along in `fields`.
fn map_hit(hit: &Value) -> ResultItem {
	let mut fields = Map::new();
	let take = |keys: &[&str]| -> String {
		for key in keys {
			if let Some(text) = hit.get(*key).and_then(|v| v.as_str())
				&& !text.is_empty()
			{
				return text.to_string();
			}
		}

		"N/A".to_string()
	};
	let title = take(&["title", "name", "heading"]);
	let content = take(&["content", "description", "body", "text", "overview"]);
	let source_url = take(&["url", "source_url", "link"]);
	let id = hit
		.get("id")
		.map(|v| match v {
			Value::String(s) => s.clone(),
			other => other.to_string(),
		})
		.unwrap_or_default();

	if let Some(object) = hit.as_object() {
		for (key, value) in object {
			if matches!(
				key.as_str(),
				"id" | "title" | "name" | "heading" | "content" | "description" | "body"
					| "text" | "overview" | "url" | "source_url" | "link"
			) {
				continue;
			}

			fields.insert(key.clone(), value.clone());
		}
	}

	ResultItem {
		id,
		backend: "meilisearch".to_string(),
		result_type: "generic".to_string(),
		title,
		content,
		source_url,
		fields,
	}
}
