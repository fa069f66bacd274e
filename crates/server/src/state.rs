use std::sync::Arc;

use frameflow_core::{Config, JobStore, PipelineOrchestrator, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn JobStore>,
    orchestrator: Arc<PipelineOrchestrator>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn JobStore>,
        orchestrator: Arc<PipelineOrchestrator>,
    ) -> Self {
        Self {
            config,
            store,
            orchestrator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn store(&self) -> &dyn JobStore {
        self.store.as_ref()
    }

    pub fn orchestrator(&self) -> &PipelineOrchestrator {
        self.orchestrator.as_ref()
    }
}
