pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Backend {backend} is unavailable: {message}")]
	Unavailable { backend: String, message: String },
	#[error("Backend {backend} timed out.")]
	Timeout { backend: String },
	#[error("Backend {name} is not configured.")]
	NotConfigured { name: String },
	#[error("Document {doc_id} not found.")]
	DocumentNotFound { doc_id: String },
	#[error("{message}")]
	InvalidResponse { message: String },
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
}

impl Error {
	/// Collapse a transport error into the backend taxonomy, keeping
	/// timeouts distinguishable from other unavailability.
	pub fn from_transport(backend: &str, err: reqwest::Error) -> Self {
		if err.is_timeout() {
			Self::Timeout { backend: backend.to_string() }
		} else {
			Self::Unavailable { backend: backend.to_string(), message: err.to_string() }
		}
	}
}
