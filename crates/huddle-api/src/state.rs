//! Application state shared across handlers.

use std::sync::Arc;

use huddle_orchestrator::SessionOrchestrator;

use crate::config::ApiConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Starts and stops meeting runs; owns the session table.
    pub orchestrator: SessionOrchestrator,
}

impl AppState {
    pub fn new(config: ApiConfig, orchestrator: SessionOrchestrator) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator,
        }
    }
}
