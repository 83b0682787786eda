//! Normalized search result item.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn default_result_type() -> String {
	"generic".to_string()
}

fn default_field() -> String {
	"N/A".to_string()
}

/// One normalized hit from a search backend.
///
/// Backends produce their own raw shapes and map them to this generic
/// representation before the item enters verification. `result_type`
/// selects the verification prompt flavor ("paper" vs "generic"); `fields`
/// carries any backend-specific metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
	#[serde(default)]
	pub id: String,
	/// Tag of the backend adapter that produced this item.
	#[serde(default)]
	pub backend: String,
	#[serde(default = "default_result_type")]
	pub result_type: String,
	#[serde(default = "default_field")]
	pub title: String,
	#[serde(default = "default_field")]
	pub content: String,
	#[serde(default = "default_field")]
	pub source_url: String,
	#[serde(default)]
	pub fields: Map<String, Value>,
}

impl ResultItem {
	/// Render the item as an XML block for the verification prompt, skipping
	/// empty and placeholder values.
	pub fn prompt_block(&self) -> String {
		let mut parts = vec!["<result_info>".to_string()];

		parts.push(format!("    <title>{}</title>", self.title));
		parts.push(format!("    <content>{}</content>", self.content));

		if !self.source_url.is_empty() && self.source_url != "N/A" {
			parts.push(format!("    <source_url>{}</source_url>", self.source_url));
		}

		for (key, value) in &self.fields {
			let text = match value {
				Value::String(s) => s.clone(),
				Value::Null => continue,
				other => other.to_string(),
			};

			if text.is_empty() || text == "N/A" {
				continue;
			}

			parts.push(format!("    <{key}>{text}</{key}>"));
		}

		parts.push("</result_info>".to_string());

		parts.join("\n")
	}
}
