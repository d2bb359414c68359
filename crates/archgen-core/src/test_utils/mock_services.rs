// src/test_utils/mock_services.rs
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::errors::HandlerError;
use crate::github::{PublishOutcome, PublishRequest, RepositoryPublisher};
use crate::invocation::DiagramReference;
use crate::llm::{InferenceService, ModelPrompt, ModelResponse};
use crate::rag::{RetrievalQuery, RetrievalService};
use crate::storage::ObjectStore;

pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Object store returning one canned result and recording every fetch.
#[derive(Clone)]
pub struct MockObjectStore {
    result: Result<Vec<u8>, HandlerError>,
    pub fetched: Arc<Mutex<Vec<DiagramReference>>>,
}

impl MockObjectStore {
    pub fn with_bytes(bytes: &[u8]) -> Self {
        Self {
            result: Ok(bytes.to_vec()),
            fetched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(HandlerError::ObjectFetch(message.to_string())),
            fetched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn fetched(&self) -> Vec<DiagramReference> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn get_object(&self, reference: &DiagramReference) -> Result<Vec<u8>, HandlerError> {
        self.fetched.lock().unwrap().push(reference.clone());
        self.result.clone()
    }
}

/// Inference service replaying queued responses in order.
#[derive(Clone)]
pub struct MockInference {
    responses: Arc<Mutex<VecDeque<Result<ModelResponse, HandlerError>>>>,
    pub prompts: Arc<Mutex<Vec<(String, ModelPrompt)>>>,
}

impl MockInference {
    pub fn new(responses: Vec<Result<ModelResponse, HandlerError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_text(text: &str) -> Self {
        Self::new(vec![Ok(ModelResponse::with_text(text))])
    }

    pub fn prompts(&self) -> Vec<(String, ModelPrompt)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceService for MockInference {
    async fn invoke(
        &self,
        model_id: &str,
        prompt: &ModelPrompt,
    ) -> Result<ModelResponse, HandlerError> {
        self.prompts
            .lock()
            .unwrap()
            .push((model_id.to_string(), prompt.clone()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(HandlerError::Inference("no more mock responses".to_string())))
    }
}

#[derive(Clone)]
pub struct MockRetrieval {
    result: Result<String, HandlerError>,
    pub queries: Arc<Mutex<Vec<RetrievalQuery>>>,
}

impl MockRetrieval {
    pub fn with_text(text: &str) -> Self {
        Self {
            result: Ok(text.to_string()),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(error: HandlerError) -> Self {
        Self {
            result: Err(error),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn queries(&self) -> Vec<RetrievalQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl RetrievalService for MockRetrieval {
    async fn retrieve_and_generate(&self, query: &RetrievalQuery) -> Result<String, HandlerError> {
        self.queries.lock().unwrap().push(query.clone());
        self.result.clone()
    }
}

#[derive(Clone)]
pub struct MockPublisher {
    result: Result<(), HandlerError>,
    pub published: Arc<Mutex<Vec<PublishRequest>>>,
}

impl MockPublisher {
    pub fn succeeding() -> Self {
        Self {
            result: Ok(()),
            published: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(error: HandlerError) -> Self {
        Self {
            result: Err(error),
            published: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn published(&self) -> Vec<PublishRequest> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepositoryPublisher for MockPublisher {
    async fn create_and_commit_file(
        &self,
        request: &PublishRequest,
    ) -> Result<PublishOutcome, HandlerError> {
        self.published.lock().unwrap().push(request.clone());
        self.result.clone()?;
        Ok(PublishOutcome {
            path: request.path.clone(),
            created: true,
            previous_sha: None,
            commit_sha: Some("commit-1".to_string()),
        })
    }
}
