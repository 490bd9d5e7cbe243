use std::sync::Arc;

use crate::chat::ChatService;
use crate::config::Config;
use crate::llm_client::ModelGateway;
use crate::pipeline::orchestrator::Orchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub gateway: ModelGateway,
    pub pipeline: Arc<Orchestrator>,
    /// Conversational assistant. Shares nothing mutable with the pipeline.
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(config: Config, gateway: ModelGateway) -> Self {
        Self {
            pipeline: Arc::new(Orchestrator::new(gateway.clone(), config.stage_timeout)),
            chat: Arc::new(ChatService::new(gateway.clone())),
            gateway,
            config,
        }
    }
}
