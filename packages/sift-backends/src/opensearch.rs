//! OpenSearch / Elasticsearch-compatible backend adapter.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::{Map, Value};

use sift_config::OpenSearchBackend;
use sift_domain::ResultItem;

use crate::{BackendHealth, BoxFuture, Error, HealthStatus, Result, SearchBackend};

pub struct OpenSearch {
	base_url: String,
	index: String,
	username: Option<String>,
	password: Option<String>,
	client: Client,
}

impl OpenSearch {
	pub fn new(cfg: &OpenSearchBackend) -> Result<Self> {
		let client =
			Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self {
			base_url: cfg.url.trim_end_matches('/').to_string(),
			index: cfg.index.clone(),
			username: cfg.username.clone(),
			password: cfg.password.clone(),
			client,
		})
	}

	fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
		let builder = self.client.request(method, url);

		match &self.username {
			Some(username) => builder.basic_auth(username, self.password.as_deref()),
			None => builder,
		}
	}
}

impl SearchBackend for OpenSearch {
	fn name(&self) -> &str {
		"opensearch"
	}

	fn search<'a>(
		&'a self,
		query: &'a str,
		max_results: u32,
	) -> BoxFuture<'a, Result<Vec<ResultItem>>> {
		Box::pin(async move {
			let url = format!("{}/{}/_search", self.base_url, self.index);
			let body = serde_json::json!({
				"size": max_results,
				"query": {
					"multi_match": {
						"query": query,
						"fields": ["title^2", "content", "abstract", "description"],
					},
				},
			});
			let res = self
				.request(reqwest::Method::POST, url)
				.json(&body)
				.send()
				.await
				.map_err(|err| Error::from_transport("opensearch", err))?
				.error_for_status()
				.map_err(|err| Error::from_transport("opensearch", err))?;
			let json: Value = res.json().await?;
			let hits = json
				.pointer("/hits/hits")
				.and_then(|v| v.as_array())
				.cloned()
				.unwrap_or_default();

			Ok(hits.iter().map(map_hit).collect())
		})
	}

	fn fetch_document<'a>(&'a self, doc_id: &'a str) -> BoxFuture<'a, Result<ResultItem>> {
		Box::pin(async move {
			let url = format!("{}/{}/_doc/{doc_id}", self.base_url, self.index);
			let res = self
				.request(reqwest::Method::GET, url)
				.send()
				.await
				.map_err(|err| Error::from_transport("opensearch", err))?;

			if res.status() == reqwest::StatusCode::NOT_FOUND {
				return Err(Error::DocumentNotFound { doc_id: doc_id.to_string() });
			}

			let json: Value = res
				.error_for_status()
				.map_err(|err| Error::from_transport("opensearch", err))?
				.json()
				.await?;

			Ok(map_hit(&json))
		})
	}

	fn health_check<'a>(&'a self) -> BoxFuture<'a, BackendHealth> {
		Box::pin(async move {
			let started = Instant::now();
			let url = format!("{}/_cluster/health", self.base_url);
			let outcome = self.request(reqwest::Method::GET, url).send().await;
			let latency_ms = started.elapsed().as_millis() as u64;
			let json: Option<Value> = match outcome {
				Ok(res) => res.json().await.ok(),
				Err(err) => {
					return BackendHealth {
						status: HealthStatus::Unhealthy,
						latency_ms,
						message: Some(err.to_string()),
					};
				},
			};
			let status = json
				.as_ref()
				.and_then(|v| v.get("status"))
				.and_then(|v| v.as_str())
				.unwrap_or("red");

			BackendHealth {
				status: match status {
					"green" => HealthStatus::Healthy,
					"yellow" => HealthStatus::Degraded,
					_ => HealthStatus::Unhealthy,
				},
				latency_ms,
				message: None,
			}
		})
	}
}

/// Map one `_search` hit (or `_doc` response) to the normalized item shape.
fn map_hit(hit: &Value) -> ResultItem {
	let source = hit.get("_source").cloned().unwrap_or_else(|| hit.clone());
	let pick = |keys: &[&str]| -> String {
		for key in keys {
			if let Some(text) = source.get(*key).and_then(|v| v.as_str())
				&& !text.is_empty()
			{
				return text.to_string();
			}
		}

		"N/A".to_string()
	};
	let mut fields = Map::new();

	if let Some(object) = source.as_object() {
		for (key, value) in object {
			if matches!(
				key.as_str(),
				"title" | "content" | "abstract" | "description" | "url" | "source_url"
			) {
				continue;
			}

			fields.insert(key.clone(), value.clone());
		}
	}

	ResultItem {
		id: hit.get("_id").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
		backend: "opensearch".to_string(),
		result_type: "generic".to_string(),
		title: pick(&["title"]),
		content: pick(&["content", "abstract", "description"]),
		source_url: pick(&["url", "source_url"]),
		fields,
	}
}
