//! Diagram analysis: fetch the diagram, ask the model for a structured summary
//! and the clarifying questions needed before any code can be generated.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::ArchgenConfig;
use crate::context::ServiceContext;
use crate::errors::HandlerError;
use crate::handlers::{parse_event, render_failure, HandlerKind};
use crate::invocation::{HandlerResponse, InvocationRequest, ResponseEnvelope};
use crate::llm::prompt::ANALYSIS_PROMPT;
use crate::llm::{ImagePromptBuilder, InferenceService};
use crate::storage::ObjectStore;

pub struct DiagramAnalyzer {
    store: Arc<dyn ObjectStore>,
    inference: Arc<dyn InferenceService>,
    config: Arc<ArchgenConfig>,
}

impl DiagramAnalyzer {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        inference: Arc<dyn InferenceService>,
        config: Arc<ArchgenConfig>,
    ) -> Self {
        Self {
            store,
            inference,
            config,
        }
    }

    pub fn from_context(context: &ServiceContext) -> Self {
        Self::new(
            context.store.clone(),
            context.inference.clone(),
            context.config.clone(),
        )
    }

    /// Entry point for a raw runtime event.
    pub async fn handle_event(&self, event: Value) -> HandlerResponse {
        match parse_event(self.config.responses.error_style, HandlerKind::Analyzer, event) {
            Ok(request) => self.handle(&request).await,
            Err(response) => response,
        }
    }

    pub async fn handle(&self, request: &InvocationRequest) -> HandlerResponse {
        match self.analyze(request).await {
            Ok(analysis) => {
                let body = json!({
                    "message": format!("Summary and questions created are {}", analysis)
                });
                ResponseEnvelope::success(request, &body).into()
            }
            Err(err) => {
                log::error!("Diagram analysis failed: {}", err);
                render_failure(
                    self.config.responses.error_style,
                    HandlerKind::Analyzer,
                    request,
                    &err,
                )
            }
        }
    }

    /// Model analysis text for the referenced diagram.
    pub async fn analyze(&self, request: &InvocationRequest) -> Result<String, HandlerError> {
        let reference = request.diagram_reference()?;
        let image = self.store.get_object(&reference).await?;

        let model = &self.config.model;
        let prompt = ImagePromptBuilder::new(model.anthropic_version.as_str())
            .max_tokens(model.max_tokens)
            .png(image)
            .text(ANALYSIS_PROMPT)
            .build()?;

        let response = self.inference.invoke(&model.model_id, &prompt).await?;
        let analysis = response.joined_text()?;
        log::info!("Analysis of {} produced {} chars", reference, analysis.len());
        Ok(analysis)
    }
}
