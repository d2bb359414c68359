//! Process-wide service clients
//!
//! Built once per process (one cold start) and shared by every invocation the
//! process serves.

use std::sync::Arc;

use aws_config::BehaviorVersion;

use crate::config::{ArchgenConfig, ConfigLoader};
use crate::errors::HandlerError;
use crate::github::{GitHubContentsClient, RepositoryPublisher};
use crate::llm::{BedrockInference, InferenceService};
use crate::rag::{KnowledgeBaseRetrieval, RetrievalService};
use crate::storage::{ObjectStore, S3ObjectStore};

#[derive(Clone)]
pub struct ServiceContext {
    pub config: Arc<ArchgenConfig>,
    pub store: Arc<dyn ObjectStore>,
    pub inference: Arc<dyn InferenceService>,
    pub retrieval: Arc<dyn RetrievalService>,
    pub publisher: Arc<dyn RepositoryPublisher>,
}

impl ServiceContext {
    /// Load configuration from the environment and build the AWS and GitHub clients.
    pub async fn from_env() -> Result<Self, HandlerError> {
        let config = ConfigLoader::from_env().await?;
        Self::with_config(config).await
    }

    pub async fn with_config(config: ArchgenConfig) -> Result<Self, HandlerError> {
        let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        log::info!(
            "AWS region: {}",
            sdk_config
                .region()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "<unset>".to_string())
        );

        let publisher = GitHubContentsClient::from_config(&config.repository)?;

        Ok(Self {
            store: Arc::new(S3ObjectStore::from_sdk_config(&sdk_config)),
            inference: Arc::new(BedrockInference::from_sdk_config(&sdk_config)),
            retrieval: Arc::new(KnowledgeBaseRetrieval::from_sdk_config(&sdk_config)),
            publisher: Arc::new(publisher),
            config: Arc::new(config),
        })
    }
}
