//! Error types for the action-group handlers
//!
//! Every external dependency a handler touches has its own variant so that the
//! dependency policy table can decide per kind whether a failure aborts the
//! pipeline or degrades to a fallback value. The HTTP status reported back to the
//! agent orchestrator is derived from the variant.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HandlerError {
    #[error("Missing required property '{0}'")]
    MissingProperty(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Error fetching image from S3: {0}")]
    ObjectFetch(String),
    #[error("Error invoking model: {0}")]
    Inference(String),
    #[error("Malformed model response: {0}")]
    MalformedModelResponse(String),
    #[error("Knowledge base query failed: {0}")]
    Retrieval(String),
    #[error("Malformed knowledge base response: {0}")]
    MalformedRetrievalResponse(String),
    #[error("Failed to publish '{path}': {message}")]
    Publish { path: String, message: String },
    #[error("Prompt construction failed: {0}")]
    Prompt(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl HandlerError {
    pub fn config(message: impl Into<String>) -> Self {
        HandlerError::ConfigError(message.into())
    }

    /// Status code reported in the response envelope for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::MissingProperty(_) | HandlerError::InvalidRequest(_) => 400,
            _ => 500,
        }
    }

    /// Short, caller-facing summary. The full message goes into `details`.
    pub fn summary(&self) -> &'static str {
        match self {
            HandlerError::MissingProperty(_) | HandlerError::InvalidRequest(_) => {
                "The request is missing required information."
            }
            HandlerError::ObjectFetch(_) => "The architecture diagram could not be fetched.",
            HandlerError::Inference(_) | HandlerError::MalformedModelResponse(_) => {
                "The model could not process the architecture diagram."
            }
            HandlerError::Retrieval(_) | HandlerError::MalformedRetrievalResponse(_) => {
                "The module definitions could not be retrieved."
            }
            HandlerError::Publish { .. } => "The generated code could not be committed.",
            _ => "An error occurred during the process.",
        }
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        HandlerError::Serialization(err.to_string())
    }
}
