pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Run-fatal failures. Per-item verification failures never surface here;
/// they degrade into sentinel validations inside the run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Planning failed: {message}")]
	Planning { message: String },
	#[error("No search backend produced results; all selected backends failed.")]
	AllBackendsUnavailable,
	#[error("Unknown backend: {name}")]
	BackendNotFound { name: String },
	#[error("Document not found: {doc_id}")]
	DocumentNotFound { doc_id: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Run exceeded its deadline.")]
	Timeout,
	#[error("Run cancelled by the consumer.")]
	Cancelled,
	#[error("Provider error: {message}")]
	Provider { message: String },
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: format!("{err:#}") }
	}
}

impl From<sift_backends::Error> for Error {
	fn from(err: sift_backends::Error) -> Self {
		match err {
			sift_backends::Error::NotConfigured { name } => Self::BackendNotFound { name },
			sift_backends::Error::DocumentNotFound { doc_id } => Self::DocumentNotFound { doc_id },
			other => Self::Provider { message: other.to_string() },
		}
	}
}
