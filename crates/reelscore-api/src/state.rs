//! Application state.

use std::sync::Arc;

use reelscore_firestore::{AnalysisRepository, FirestoreClient};
use reelscore_openai::OpenAiClient;
use reelscore_pipeline::{Collaborators, Orchestrator, PipelineConfig};
use reelscore_storage::R2Client;
use tracing::info;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Create application state wired to the production collaborators.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let pipeline_config = PipelineConfig::from_env();

        let storage = R2Client::from_env().await?;
        let firestore = FirestoreClient::from_env().await?;
        let openai = OpenAiClient::from_env()?;
        info!(
            collection = %firestore.config().collection,
            max_duration_secs = pipeline_config.max_video_duration_secs,
            "Collaborators configured"
        );

        let collaborators = Collaborators::production(
            &pipeline_config,
            storage,
            openai,
            AnalysisRepository::new(firestore),
        );
        let orchestrator = Orchestrator::new(pipeline_config, collaborators)?;

        Ok(Self::with_orchestrator(config, orchestrator))
    }

    /// Create application state around an existing orchestrator.
    pub fn with_orchestrator(config: ApiConfig, orchestrator: Orchestrator) -> Self {
        Self {
            config,
            orchestrator: Arc::new(orchestrator),
        }
    }
}
