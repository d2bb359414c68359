//! Knowledge-base retrieval of infrastructure module definitions
//!
//! The retrieval service answers one fixed natural-language query against a
//! knowledge base of module sources and returns free text. That text is not
//! interpreted here; it is embedded verbatim into the code-generation prompt.
//! Retrieval is an enrichment, so the generator treats its failures as
//! best effort (see [`crate::policy`]).

use async_trait::async_trait;
use serde_json::Value;

use crate::config::IacLanguage;
use crate::errors::HandlerError;

pub mod knowledge_base;

pub use knowledge_base::KnowledgeBaseRetrieval;

#[async_trait]
pub trait RetrievalService: Send + Sync {
    /// Answer text (`output.text`) for the query.
    async fn retrieve_and_generate(&self, query: &RetrievalQuery) -> Result<String, HandlerError>;
}

/// Query text for the module sources of `language`.
pub fn module_sources_query(language: IacLanguage) -> String {
    format!(
        "Retrieve {} module sources for AWS services",
        language.display_name()
    )
}

/// Validated retrieve-and-generate input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalQuery {
    text: String,
    knowledge_base_id: String,
    model_arn: String,
}

impl RetrievalQuery {
    pub fn new(
        text: impl Into<String>,
        knowledge_base_id: impl Into<String>,
        model_arn: impl Into<String>,
    ) -> Result<Self, HandlerError> {
        let text = text.into();
        let knowledge_base_id = knowledge_base_id.into();
        let model_arn = model_arn.into();

        if text.trim().is_empty() {
            return Err(HandlerError::Retrieval("query text is empty".to_string()));
        }
        if knowledge_base_id.trim().is_empty() {
            return Err(HandlerError::Retrieval("knowledge base id is empty".to_string()));
        }
        if !model_arn.starts_with("arn:") {
            return Err(HandlerError::Retrieval(format!(
                "model identifier '{}' is not an ARN",
                model_arn
            )));
        }

        Ok(Self {
            text,
            knowledge_base_id,
            model_arn,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn knowledge_base_id(&self) -> &str {
        &self.knowledge_base_id
    }

    pub fn model_arn(&self) -> &str {
        &self.model_arn
    }
}

/// Retrieved module definitions, or nothing when retrieval degraded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ModuleDefinitions {
    #[default]
    Empty,
    Text(String),
}

impl ModuleDefinitions {
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            ModuleDefinitions::Empty
        } else {
            ModuleDefinitions::Text(text)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ModuleDefinitions::Empty)
    }

    /// JSON literal embedded in the prompt: a quoted string, or `{}` when empty.
    pub fn to_prompt_literal(&self) -> String {
        match self {
            ModuleDefinitions::Empty => "{}".to_string(),
            ModuleDefinitions::Text(text) => Value::String(text.clone()).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_sources_query() {
        assert_eq!(
            module_sources_query(IacLanguage::Terraform),
            "Retrieve Terraform module sources for AWS services"
        );
        assert_eq!(
            module_sources_query(IacLanguage::CloudFormation),
            "Retrieve CloudFormation module sources for AWS services"
        );
    }

    #[test]
    fn test_query_validation() {
        let arn = "arn:aws:bedrock:us-east-1::foundation-model/anthropic.claude-v2";
        assert!(RetrievalQuery::new("q", "KB1", arn).is_ok());
        assert!(RetrievalQuery::new("", "KB1", arn).is_err());
        assert!(RetrievalQuery::new("q", " ", arn).is_err());
        assert!(RetrievalQuery::new("q", "KB1", "anthropic.claude-v2").is_err());
    }

    #[test]
    fn test_prompt_literal() {
        assert_eq!(ModuleDefinitions::Empty.to_prompt_literal(), "{}");
        assert_eq!(
            ModuleDefinitions::from_text("line one\n\"quoted\"").to_prompt_literal(),
            r#""line one\n\"quoted\"""#
        );
        assert!(ModuleDefinitions::from_text("  ").is_empty());
    }
}
