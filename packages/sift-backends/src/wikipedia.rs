//! Wikipedia backend adapter over the MediaWiki search API.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::{Map, Value};

use sift_config::WikipediaBackend;
use sift_domain::ResultItem;

use crate::{BackendHealth, BoxFuture, Error, HealthStatus, Result, SearchBackend};

const USER_AGENT: &str = concat!("sift/", env!("CARGO_PKG_VERSION"));

pub struct Wikipedia {
	api_base: String,
	article_base: String,
	client: Client,
}

impl Wikipedia {
	pub fn new(cfg: &WikipediaBackend) -> Result<Self> {
		let client = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.user_agent(USER_AGENT)
			.build()?;
		let article_base =
			format!("{}/wiki", cfg.api_base.trim_end_matches("/w/api.php"));

		Ok(Self { api_base: cfg.api_base.clone(), article_base, client })
	}
}

impl SearchBackend for Wikipedia {
	fn name(&self) -> &str {
		"wikipedia"
	}

	fn search<'a>(
		&'a self,
		query: &'a str,
		max_results: u32,
	) -> BoxFuture<'a, Result<Vec<ResultItem>>> {
		Box::pin(async move {
			let res = self
				.client
				.get(&self.api_base)
				.query(&[
					("action", "query"),
					("list", "search"),
					("srsearch", query),
					("srlimit", &max_results.to_string()),
					("format", "json"),
				])
				.send()
				.await
				.map_err(|err| Error::from_transport("wikipedia", err))?
				.error_for_status()
				.map_err(|err| Error::from_transport("wikipedia", err))?;
			let json: Value = res.json().await?;
			let hits = json
				.pointer("/query/search")
				.and_then(|v| v.as_array())
				.cloned()
				.unwrap_or_default();

			Ok(hits.iter().map(|page| map_page(page, &self.article_base)).collect())
		})
	}

	fn fetch_document<'a>(&'a self, doc_id: &'a str) -> BoxFuture<'a, Result<ResultItem>> {
		Box::pin(async move {
			let res = self
				.client
				.get(&self.api_base)
				.query(&[
					("action", "query"),
					("prop", "extracts"),
					("explaintext", "1"),
					("pageids", doc_id),
					("format", "json"),
				])
				.send()
				.await
				.map_err(|err| Error::from_transport("wikipedia", err))?
				.error_for_status()
				.map_err(|err| Error::from_transport("wikipedia", err))?;
			let json: Value = res.json().await?;
			let Some(page) = json
				.pointer(&format!("/query/pages/{doc_id}"))
				.filter(|page| page.get("missing").is_none())
			else {
				return Err(Error::DocumentNotFound { doc_id: doc_id.to_string() });
			};

			let mut item = map_page(page, &self.article_base);

			if let Some(extract) = page.get("extract").and_then(|v| v.as_str()) {
				item.content = extract.to_string();
			}

			Ok(item)
		})
	}

	fn health_check<'a>(&'a self) -> BoxFuture<'a, BackendHealth> {
		Box::pin(async move {
			let started = Instant::now();
			let outcome = self
				.client
				.get(&self.api_base)
				.query(&[("action", "query"), ("meta", "siteinfo"), ("format", "json")])
				.send()
				.await;
			let latency_ms = started.elapsed().as_millis() as u64;

			match outcome {
				Ok(res) if res.status().is_success() => {
					BackendHealth { status: HealthStatus::Healthy, latency_ms, message: None }
				},
				Ok(res) => BackendHealth {
					status: HealthStatus::Degraded,
					latency_ms,
					message: Some(format!("Site info returned {}.", res.status())),
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

/// Map one MediaWiki search hit to the normalized item shape. Snippets come
/// back with search-highlight markup, which is stripped.
fn map_page(page: &Value, article_base: &str) -> ResultItem {
	let title = page.get("title").and_then(|v| v.as_str()).unwrap_or("N/A").to_string();
	let snippet = page
		.get("snippet")
		.and_then(|v| v.as_str())
		.map(strip_markup)
		.filter(|text| !text.is_empty())
		.unwrap_or_else(|| "N/A".to_string());
	let page_id = page
		.get("pageid")
		.and_then(|v| v.as_u64())
		.map(|id| id.to_string())
		.unwrap_or_default();
	let mut fields = Map::new();

	if let Some(words) = page.get("wordcount").and_then(|v| v.as_u64()) {
		fields.insert("wordcount".to_string(), Value::from(words));
	}
	if let Some(timestamp) = page.get("timestamp").and_then(|v| v.as_str()) {
		fields.insert("last_edited".to_string(), Value::String(timestamp.to_string()));
	}

	ResultItem {
		source_url: format!("{article_base}/{}", title.replace(' ', "_")),
		id: page_id,
		backend: "wikipedia".to_string(),
		result_type: "generic".to_string(),
		title,
		content: snippet,
		fields,
	}
}

fn strip_markup(snippet: &str) -> String {
	let mut out = String::with_capacity(snippet.len());
	let mut in_tag = false;

	for ch in snippet.chars() {
		match ch {
			'<' => in_tag = true,
			'>' => in_tag = false,
			_ if !in_tag => out.push(ch),
			_ => {},
		}
	}

	out.replace("&quot;", "\"").replace("&amp;", "&")
}
