//! Multimodal model invocation.
//!
//! Defines the inference trait the handlers depend on, the model response
//! format, and the Bedrock-hosted implementation. Prompt construction lives in
//! [`prompt`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::HandlerError;

pub mod bedrock;
pub mod prompt;

pub use bedrock::BedrockInference;
pub use prompt::{ImagePromptBuilder, ModelPrompt};

#[async_trait]
pub trait InferenceService: Send + Sync {
    async fn invoke(&self, model_id: &str, prompt: &ModelPrompt)
        -> Result<ModelResponse, HandlerError>;
}

/// Messages-API response body. Only `content` is relied upon; everything else
/// is optional so that trimmed-down stub responses parse too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ModelUsage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl ModelResponse {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, HandlerError> {
        serde_json::from_slice(bytes).map_err(|e| {
            HandlerError::MalformedModelResponse(format!("Failed to parse response: {}", e))
        })
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock {
                kind: Some("text".to_string()),
                text: Some(text.into()),
            }],
            ..Default::default()
        }
    }

    /// Text of the first content block.
    pub fn first_text(&self) -> Result<&str, HandlerError> {
        let block = self.content.first().ok_or_else(|| {
            HandlerError::MalformedModelResponse("response has no content blocks".to_string())
        })?;
        block.text.as_deref().ok_or_else(|| {
            HandlerError::MalformedModelResponse(format!(
                "first content block is not text (type {:?})",
                block.kind
            ))
        })
    }

    /// All text blocks concatenated in order.
    pub fn joined_text(&self) -> Result<String, HandlerError> {
        let text: String = self
            .content
            .iter()
            .filter_map(|block| block.text.as_deref())
            .collect();
        if text.is_empty() {
            return Err(HandlerError::MalformedModelResponse(
                "response has no text content".to_string(),
            ));
        }
        Ok(text)
    }
}

/// Strip one fenced code block wrapping the whole answer, if present.
///
/// The generation prompt asks for bare code, but models still occasionally
/// answer with a ```` ```hcl ```` fence. Answers holding more than one fenced
/// block are returned unchanged.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return text;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop the info string (language tag) on the opening line.
    let Some(newline) = body.find('\n') else {
        return text;
    };
    let code = body[newline + 1..].trim_end_matches(&['\n', '\r'][..]);
    if code.lines().any(|line| line.trim_start().starts_with("```")) {
        return text;
    }
    code
}
