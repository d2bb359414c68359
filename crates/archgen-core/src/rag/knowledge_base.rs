//! Bedrock knowledge base retrieve-and-generate client

use async_trait::async_trait;
use aws_sdk_bedrockagentruntime::error::DisplayErrorContext;
use aws_sdk_bedrockagentruntime::types::{
    KnowledgeBaseRetrieveAndGenerateConfiguration, RetrieveAndGenerateConfiguration,
    RetrieveAndGenerateInput, RetrieveAndGenerateType,
};
use aws_sdk_bedrockagentruntime::Client;

use crate::errors::HandlerError;
use crate::rag::{RetrievalQuery, RetrievalService};

#[derive(Debug, Clone)]
pub struct KnowledgeBaseRetrieval {
    client: Client,
}

impl KnowledgeBaseRetrieval {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_sdk_config(config: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

#[async_trait]
impl RetrievalService for KnowledgeBaseRetrieval {
    async fn retrieve_and_generate(&self, query: &RetrievalQuery) -> Result<String, HandlerError> {
        let input = RetrieveAndGenerateInput::builder()
            .text(query.text())
            .build()
            .map_err(|e| HandlerError::Retrieval(e.to_string()))?;

        let knowledge_base = KnowledgeBaseRetrieveAndGenerateConfiguration::builder()
            .knowledge_base_id(query.knowledge_base_id())
            .model_arn(query.model_arn())
            .build()
            .map_err(|e| HandlerError::Retrieval(e.to_string()))?;

        let configuration = RetrieveAndGenerateConfiguration::builder()
            .r#type(RetrieveAndGenerateType::KnowledgeBase)
            .knowledge_base_configuration(knowledge_base)
            .build()
            .map_err(|e| HandlerError::Retrieval(e.to_string()))?;

        log::info!(
            "Querying knowledge base {}: '{}'",
            query.knowledge_base_id(),
            query.text()
        );

        let response = self
            .client
            .retrieve_and_generate()
            .input(input)
            .retrieve_and_generate_configuration(configuration)
            .send()
            .await
            .map_err(|e| HandlerError::Retrieval(DisplayErrorContext(&e).to_string()))?;

        let text = response
            .output()
            .map(|output| output.text().to_string())
            .ok_or_else(|| {
                HandlerError::MalformedRetrievalResponse("response has no output.text".to_string())
            })?;

        log::debug!("Knowledge base answer ({} chars): {}", text.len(), text);
        Ok(text)
    }
}
