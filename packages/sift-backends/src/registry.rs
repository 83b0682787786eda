//! Adapter registry.
//!
//! Every configured backend is constructed once at startup and shared behind
//! an [`Arc`]. Selection preserves registration order so a run fans out over
//! backends deterministically.

use std::{collections::HashMap, sync::Arc};

use sift_config::Config;

use crate::{
	meilisearch::Meilisearch, opensearch::OpenSearch, wikipedia::Wikipedia, BackendHealth, Error,
	Result, SearchBackend,
};

pub struct BackendRegistry {
	backends: HashMap<String, Arc<dyn SearchBackend>>,
	// Registration order doubles as the default fan-out order.
	order: Vec<String>,
}

impl BackendRegistry {
	pub fn new() -> Self {
		Self { backends: HashMap::new(), order: Vec::new() }
	}

	/// Build the registry from the `[backends]` config sections. Sections
	/// that are absent are simply not registered.
	pub fn from_config(cfg: &Config) -> Result<Self> {
		let mut registry = Self::new();

		if let Some(meilisearch) = &cfg.backends.meilisearch {
			registry.register(Arc::new(Meilisearch::new(meilisearch)?));
		}
		if let Some(opensearch) = &cfg.backends.opensearch {
			registry.register(Arc::new(OpenSearch::new(opensearch)?));
		}
		if let Some(wikipedia) = &cfg.backends.wikipedia {
			registry.register(Arc::new(Wikipedia::new(wikipedia)?));
		}

		Ok(registry)
	}

	pub fn register(&mut self, backend: Arc<dyn SearchBackend>) {
		let name = backend.name().to_string();

		if !self.backends.contains_key(&name) {
			self.order.push(name.clone());
		}

		self.backends.insert(name, backend);
	}

	pub fn get(&self, name: &str) -> Result<Arc<dyn SearchBackend>> {
		self.backends
			.get(name)
			.cloned()
			.ok_or_else(|| Error::NotConfigured { name: name.to_string() })
	}

	pub fn names(&self) -> &[String] {
		&self.order
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	/// Resolve a request's backend selection. `None` falls back to every
	/// registered backend in registration order; an explicit list is honored
	/// in the order given and fails fast on unknown names.
	pub fn select(&self, requested: Option<&[String]>) -> Result<Vec<Arc<dyn SearchBackend>>> {
		match requested {
			Some(names) => names.iter().map(|name| self.get(name)).collect(),
			None => Ok(self.order.iter().filter_map(|name| self.backends.get(name).cloned()).collect()),
		}
	}

	pub async fn health_check_all(&self) -> Vec<(String, BackendHealth)> {
		let mut report = Vec::with_capacity(self.order.len());

		for name in &self.order {
			if let Some(backend) = self.backends.get(name) {
				report.push((name.clone(), backend.health_check().await));
			}
		}

		report
	}
}

impl Default for BackendRegistry {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{BoxFuture, HealthStatus};
	use sift_domain::ResultItem;

	struct Named(&'static str);

	impl SearchBackend for Named {
		fn name(&self) -> &str {
			self.0
		}

		fn search<'a>(
			&'a self,
			_query: &'a str,
			_max_results: u32,
		) -> BoxFuture<'a, Result<Vec<ResultItem>>> {
			Box::pin(async { Ok(Vec::new()) })
		}

		fn fetch_document<'a>(&'a self, doc_id: &'a str) -> BoxFuture<'a, Result<ResultItem>> {
			Box::pin(async move { Err(Error::DocumentNotFound { doc_id: doc_id.to_string() }) })
		}

		fn health_check<'a>(&'a self) -> BoxFuture<'a, BackendHealth> {
			Box::pin(async {
				BackendHealth { status: HealthStatus::Healthy, latency_ms: 0, message: None }
			})
		}
	}

	#[test]
	fn selection_preserves_registration_order() {
		let mut registry = BackendRegistry::new();

		registry.register(Arc::new(Named("wikipedia")));
		registry.register(Arc::new(Named("meilisearch")));

		let all = registry.select(None).unwrap();

		assert_eq!(
			all.iter().map(|b| b.name()).collect::<Vec<_>>(),
			["wikipedia", "meilisearch"]
		);
	}

	#[test]
	fn explicit_selection_honors_request_order() {
		let mut registry = BackendRegistry::new();

		registry.register(Arc::new(Named("a")));
		registry.register(Arc::new(Named("b")));

		let picked = registry.select(Some(&["b".to_string(), "a".to_string()])).unwrap();

		assert_eq!(picked.iter().map(|b| b.name()).collect::<Vec<_>>(), ["b", "a"]);
	}

	#[test]
	fn unknown_backend_is_an_error() {
		let registry = BackendRegistry::new();

		assert!(matches!(
			registry.select(Some(&["nope".to_string()])),
			Err(Error::NotConfigured { .. })
		));
	}
}
