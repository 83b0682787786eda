mod error;
pub mod planner;
pub mod verifier;

pub use error::{Error, Result};

use std::time::Duration;

use reqwest::{
	Client,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde_json::{Map, Value};

use sift_config::LlmProviderConfig;

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidResponse {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// POST one chat-completions request and return the parsed JSON content of
/// the first choice, stripping Markdown code fences if present.
pub(crate) async fn chat_json(
	cfg: &LlmProviderConfig,
	system_prompt: &str,
	user_prompt: &str,
) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"max_tokens": cfg.max_tokens,
		"messages": [
			{ "role": "system", "content": system_prompt },
			{ "role": "user", "content": user_prompt },
		],
	});
	let res = client
		.post(&url)
		.headers(auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;
	let Some(content) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
	else {
		return Err(Error::InvalidResponse {
			message: "Model response is missing message content.".to_string(),
		});
	};

	serde_json::from_str(strip_code_fences(content)).map_err(|_| Error::InvalidResponse {
		message: "Model content is not valid JSON.".to_string(),
	})
}

fn strip_code_fences(content: &str) -> &str {
	let trimmed = content.trim();
	let Some(inner) = trimmed.strip_prefix("```") else {
		return trimmed;
	};
	let inner = inner.strip_prefix("json").unwrap_or(inner);

	inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strips_json_code_fences() {
		let fenced = "```json\n{\"search_queries\": []}\n```";

		assert_eq!(strip_code_fences(fenced), "{\"search_queries\": []}");
	}

	#[test]
	fn leaves_bare_json_untouched() {
		assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
	}
}
