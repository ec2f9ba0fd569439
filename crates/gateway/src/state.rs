use std::sync::Arc;
use std::time::Instant;

use gg_domain::config::Config;
use gg_providers::InferenceClient;

use crate::pipeline::AnalysisPipeline;

/// Shared handler state. Holds configuration and the inference client only;
/// no user content is ever stored here.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// `None` when no API key could be resolved at startup.
    pub llm: Option<Arc<dyn InferenceClient>>,
    /// Why `llm` is `None`, for the models endpoint.
    pub llm_error: Option<String>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Arc<Config>, llm: Option<Arc<dyn InferenceClient>>) -> Self {
        Self {
            config,
            llm,
            llm_error: None,
            started_at: Instant::now(),
        }
    }

    pub fn pipeline(&self) -> Option<AnalysisPipeline> {
        self.llm
            .as_ref()
            .map(|client| AnalysisPipeline::new(client.clone(), &self.config))
    }
}
