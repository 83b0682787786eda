//! Flat export of the perfect and partial rows of a batch.

use serde::Serialize;

use crate::response::SearchResponse;

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
	query: &'a str,
	classification: &'a str,
	weighted_score: f32,
	title: &'a str,
	source_url: &'a str,
	backend: &'a str,
	summary: &'a str,
}

fn rows(results: &[SearchResponse]) -> Vec<ExportRow<'_>> {
	let mut out = Vec::new();

	for response in results {
		for (classification, bucket) in
			[("perfect", &response.perfect_results), ("partial", &response.partial_results)]
		{
			for scored in bucket {
				out.push(ExportRow {
					query: &response.query,
					classification,
					weighted_score: scored.weighted_score,
					title: &scored.result.title,
					source_url: &scored.result.source_url,
					backend: &scored.result.backend,
					summary: &scored.validation.summary,
				});
			}
		}
	}

	out
}

pub fn to_json(results: &[SearchResponse]) -> serde_json::Result<String> {
	serde_json::to_string_pretty(&rows(results))
}

pub fn to_csv(results: &[SearchResponse]) -> String {
	let mut out =
		String::from("query,classification,weighted_score,title,source_url,backend,summary\n");

	for row in rows(results) {
		let fields = [
			csv_escape(row.query),
			row.classification.to_string(),
			format!("{:.4}", row.weighted_score),
			csv_escape(row.title),
			csv_escape(row.source_url),
			csv_escape(row.backend),
			csv_escape(row.summary),
		];

		out.push_str(&fields.join(","));
		out.push('\n');
	}

	out
}

fn csv_escape(field: &str) -> String {
	if field.contains([',', '"', '\n', '\r']) {
		format!("\"{}\"", field.replace('"', "\"\""))
	} else {
		field.to_string()
	}
}
