mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Backends, Config, LlmProviderConfig, MeilisearchBackend, OpenSearchBackend, Providers, Search,
	Service, WikipediaBackend,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.search.verify_workers == 0 {
		return Err(Error::Validation {
			message: "search.verify_workers must be greater than zero.".to_string(),
		});
	}
	if cfg.search.run_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "search.run_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.search.stream_buffer == 0 {
		return Err(Error::Validation {
			message: "search.stream_buffer must be greater than zero.".to_string(),
		});
	}

	for (label, provider) in
		[("planner", &cfg.providers.planner), ("verifier", &cfg.providers.verifier)]
	{
		if provider.api_base.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_base must be non-empty."),
			});
		}
		if provider.api_key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
		if provider.model.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} model must be non-empty."),
			});
		}
		if !provider.temperature.is_finite() || provider.temperature < 0.0 {
			return Err(Error::Validation {
				message: format!("Provider {label} temperature must be zero or greater."),
			});
		}
	}

	for name in &cfg.search.default_backends {
		if !matches!(name.as_str(), "meilisearch" | "opensearch" | "wikipedia") {
			return Err(Error::Validation {
				message: format!("Unknown backend {name} in search.default_backends."),
			});
		}

		let configured = match name.as_str() {
			"meilisearch" => cfg.backends.meilisearch.is_some(),
			"opensearch" => cfg.backends.opensearch.is_some(),
			_ => cfg.backends.wikipedia.is_some(),
		};

		if !configured {
			return Err(Error::Validation {
				message: format!(
					"Backend {name} is listed in search.default_backends but has no [backends.{name}] section."
				),
			});
		}
	}

	if let Some(meilisearch) = cfg.backends.meilisearch.as_ref()
		&& meilisearch.url.trim().is_empty()
	{
		return Err(Error::Validation {
			message: "backends.meilisearch.url must be non-empty.".to_string(),
		});
	}
	if let Some(opensearch) = cfg.backends.opensearch.as_ref()
		&& opensearch.url.trim().is_empty()
	{
		return Err(Error::Validation {
			message: "backends.opensearch.url must be non-empty.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if let Some(meilisearch) = cfg.backends.meilisearch.as_mut()
		&& meilisearch.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false)
	{
		meilisearch.api_key = None;
	}
	if let Some(opensearch) = cfg.backends.opensearch.as_mut() {
		if opensearch.username.as_deref().map(|value| value.trim().is_empty()).unwrap_or(false) {
			opensearch.username = None;
		}
		if opensearch.password.as_deref().map(|value| value.trim().is_empty()).unwrap_or(false) {
			opensearch.password = None;
		}
	}
}
