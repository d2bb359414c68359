//! Bedrock runtime client for Anthropic Messages-API models

use async_trait::async_trait;
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::primitives::Blob;
use aws_sdk_bedrockruntime::Client;

use crate::errors::HandlerError;
use crate::llm::{InferenceService, ModelPrompt, ModelResponse};

const CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone)]
pub struct BedrockInference {
    client: Client,
}

impl BedrockInference {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_sdk_config(config: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

#[async_trait]
impl InferenceService for BedrockInference {
    async fn invoke(
        &self,
        model_id: &str,
        prompt: &ModelPrompt,
    ) -> Result<ModelResponse, HandlerError> {
        let body = prompt.to_bytes()?;
        log::info!(
            "Invoking model {} ({} byte request, max_tokens {})",
            model_id,
            body.len(),
            prompt.max_tokens()
        );

        let output = self
            .client
            .invoke_model()
            .model_id(model_id)
            .content_type(CONTENT_TYPE)
            .accept(CONTENT_TYPE)
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|e| HandlerError::Inference(DisplayErrorContext(&e).to_string()))?;

        let response = ModelResponse::from_slice(output.body().as_ref())?;
        if let Some(usage) = &response.usage {
            log::debug!(
                "Model usage: {} input tokens, {} output tokens",
                usage.input_tokens,
                usage.output_tokens
            );
        }
        Ok(response)
    }
}
