use std::sync::Arc;

use sift_backends::BackendRegistry;
use sift_engine::SiftEngine;

#[derive(Clone)]
pub struct AppState {
	pub engine: Arc<SiftEngine>,
}

impl AppState {
	pub fn new(config: sift_config::Config) -> color_eyre::Result<Self> {
		let backends = BackendRegistry::from_config(&config)?;

		Ok(Self { engine: Arc::new(SiftEngine::new(config, backends)) })
	}

	pub fn with_engine(engine: Arc<SiftEngine>) -> Self {
		Self { engine }
	}
}
