//! IaC generation and publishing
//!
//! Retrieves module definitions from the knowledge base, asks the model for
//! code matching the diagram and the agreed draft, and commits the result to
//! the configured repository path.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::{ArchgenConfig, Secrets};
use crate::context::ServiceContext;
use crate::errors::HandlerError;
use crate::github::{PublishOutcome, PublishRequest, RepositoryPublisher};
use crate::handlers::{parse_event, render_failure, HandlerKind};
use crate::invocation::{
    DiagramReference, HandlerResponse, InvocationRequest, ResponseEnvelope, DRAFT_PROPERTY,
};
use crate::llm::prompt::generation_prompt;
use crate::llm::{strip_code_fence, ImagePromptBuilder, InferenceService};
use crate::policy::{Dependency, PolicyTable};
use crate::rag::{module_sources_query, ModuleDefinitions, RetrievalQuery, RetrievalService};
use crate::storage::ObjectStore;

pub struct IacGenerator {
    store: Arc<dyn ObjectStore>,
    inference: Arc<dyn InferenceService>,
    retrieval: Arc<dyn RetrievalService>,
    publisher: Arc<dyn RepositoryPublisher>,
    config: Arc<ArchgenConfig>,
    policies: PolicyTable,
    secrets: Option<Secrets>,
}

impl IacGenerator {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        inference: Arc<dyn InferenceService>,
        retrieval: Arc<dyn RetrievalService>,
        publisher: Arc<dyn RepositoryPublisher>,
        config: Arc<ArchgenConfig>,
    ) -> Self {
        Self {
            store,
            inference,
            retrieval,
            publisher,
            config,
            policies: PolicyTable::default(),
            secrets: None,
        }
    }

    pub fn from_context(context: &ServiceContext) -> Self {
        Self::new(
            context.store.clone(),
            context.inference.clone(),
            context.retrieval.clone(),
            context.publisher.clone(),
            context.config.clone(),
        )
    }

    pub fn with_policies(mut self, policies: PolicyTable) -> Self {
        self.policies = policies;
        self
    }

    /// Use fixed secrets instead of reading the environment per invocation.
    pub fn with_secrets(mut self, secrets: Secrets) -> Self {
        self.secrets = Some(secrets);
        self
    }

    pub async fn handle_event(&self, event: Value) -> HandlerResponse {
        match parse_event(self.config.responses.error_style, HandlerKind::Generator, event) {
            Ok(request) => self.handle(&request).await,
            Err(response) => response,
        }
    }

    pub async fn handle(&self, request: &InvocationRequest) -> HandlerResponse {
        match self.generate_and_publish(request).await {
            Ok(url) => {
                let body = json!({
                    "message": format!(
                        "{} code updated successfully",
                        self.config.iac.language.display_name()
                    ),
                    "main_tf_path": url,
                });
                ResponseEnvelope::success(request, &body).into()
            }
            Err(err) => {
                log::error!("IaC generation failed: {}", err);
                render_failure(
                    self.config.responses.error_style,
                    HandlerKind::Generator,
                    request,
                    &err,
                )
            }
        }
    }

    /// Run the whole pipeline; returns the web URL of the committed file.
    pub async fn generate_and_publish(
        &self,
        request: &InvocationRequest,
    ) -> Result<String, HandlerError> {
        let reference = request.diagram_reference()?;
        let draft = request.property(DRAFT_PROPERTY)?;
        let secrets = match &self.secrets {
            Some(secrets) => secrets.clone(),
            None => Secrets::resolve(&self.config)?,
        };

        let definitions = self
            .retrieve_module_definitions(&secrets.knowledge_base_id)
            .await?;
        let prompt = generation_prompt(self.config.iac.language, draft, &definitions);

        let code = self.invoke_model(&reference, &prompt).await?;
        let outcome = self.publish(&secrets.github_token, code).await?;
        log::info!(
            "Committed {} ({}, commit {})",
            outcome.path,
            if outcome.created { "created" } else { "updated" },
            outcome.commit_sha.as_deref().unwrap_or("unknown")
        );

        Ok(self.config.repository.file_web_url())
    }

    /// Module definitions for the configured language, degraded per the
    /// retrieval policy.
    pub async fn retrieve_module_definitions(
        &self,
        knowledge_base_id: &str,
    ) -> Result<ModuleDefinitions, HandlerError> {
        let result = self.query_knowledge_base(knowledge_base_id).await;
        self.policies
            .resolve(Dependency::Retrieval, result, ModuleDefinitions::default)
    }

    async fn query_knowledge_base(
        &self,
        knowledge_base_id: &str,
    ) -> Result<ModuleDefinitions, HandlerError> {
        let query = RetrievalQuery::new(
            module_sources_query(self.config.iac.language),
            knowledge_base_id,
            self.config.retrieval.model_arn.as_str(),
        )?;
        let text = self.retrieval.retrieve_and_generate(&query).await?;
        Ok(ModuleDefinitions::from_text(text))
    }

    /// Generated code for the diagram, with any wrapping code fence removed.
    pub async fn invoke_model(
        &self,
        reference: &DiagramReference,
        instruction: &str,
    ) -> Result<String, HandlerError> {
        let image = self
            .policies
            .require(Dependency::ObjectStore, self.store.get_object(reference).await)?;

        let model = &self.config.model;
        let prompt = ImagePromptBuilder::new(model.anthropic_version.as_str())
            .max_tokens(model.max_tokens)
            .sampling(model.generation)
            .png(image)
            .text(instruction)
            .build()?;

        let response = self.policies.require(
            Dependency::Inference,
            self.inference.invoke(&model.model_id, &prompt).await,
        )?;
        let code = strip_code_fence(response.first_text()?);
        if code.trim().is_empty() {
            return Err(HandlerError::MalformedModelResponse(
                "model returned no code".to_string(),
            ));
        }
        Ok(code.to_string())
    }

    pub async fn publish(
        &self,
        token: &str,
        content: String,
    ) -> Result<PublishOutcome, HandlerError> {
        let request = PublishRequest::for_repository(&self.config.repository, token, content);
        log::info!(
            "Publishing {} bytes to {}/{}:{}",
            request.content.len(),
            request.owner,
            request.repo,
            request.path
        );
        let outcome = self.publisher.create_and_commit_file(&request).await;
        self.policies.require(Dependency::Publish, outcome)
    }
}
