//! Configuration validation
//!
//! Catches settings that would only fail later, mid-invocation, against a live
//! service: empty identifiers, out-of-range sampling values, malformed paths.

use super::types::*;
use crate::errors::HandlerError;

impl ArchgenConfig {
    pub fn validate(&self) -> Result<(), HandlerError> {
        self.model.validate()?;
        self.retrieval.validate()?;
        self.repository.validate()?;
        Ok(())
    }
}

impl ModelConfig {
    fn validate(&self) -> Result<(), HandlerError> {
        require_non_empty("model.model_id", &self.model_id)?;
        require_non_empty("model.anthropic_version", &self.anthropic_version)?;
        if self.max_tokens == 0 {
            return Err(HandlerError::config("model.max_tokens must be greater than 0"));
        }
        let sampling = &self.generation;
        if !(0.0..=1.0).contains(&sampling.temperature) {
            return Err(HandlerError::config(format!(
                "model.generation.temperature must be between 0 and 1, got {}",
                sampling.temperature
            )));
        }
        if !(0.0..=1.0).contains(&sampling.top_p) {
            return Err(HandlerError::config(format!(
                "model.generation.top_p must be between 0 and 1, got {}",
                sampling.top_p
            )));
        }
        Ok(())
    }
}

impl RetrievalConfig {
    fn validate(&self) -> Result<(), HandlerError> {
        require_non_empty("retrieval.knowledge_base_id_env", &self.knowledge_base_id_env)?;
        require_non_empty("retrieval.model_arn", &self.model_arn)?;
        if !self.model_arn.starts_with("arn:") {
            return Err(HandlerError::config(format!(
                "retrieval.model_arn must be an ARN, got '{}'",
                self.model_arn
            )));
        }
        Ok(())
    }
}

impl RepositoryConfig {
    fn validate(&self) -> Result<(), HandlerError> {
        require_non_empty("repository.owner", &self.owner)?;
        require_non_empty("repository.name", &self.name)?;
        require_non_empty("repository.path", &self.path)?;
        require_non_empty("repository.commit_message", &self.commit_message)?;
        require_non_empty("repository.token_env", &self.token_env)?;

        if self.owner.contains('/') || self.name.contains('/') {
            return Err(HandlerError::config(
                "repository.owner and repository.name must not contain '/'",
            ));
        }
        if self.path.starts_with('/') || self.path.ends_with('/') {
            return Err(HandlerError::config(format!(
                "repository.path must be a relative file path, got '{}'",
                self.path
            )));
        }
        if self.path.split('/').any(|segment| segment.is_empty() || segment == "..") {
            return Err(HandlerError::config(format!(
                "repository.path contains an invalid segment: '{}'",
                self.path
            )));
        }
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err(HandlerError::config(format!(
                "repository.api_base must be an http(s) URL, got '{}'",
                self.api_base
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(HandlerError::config("repository.timeout_seconds must be greater than 0"));
        }
        if let Some(committer) = &self.committer {
            require_non_empty("repository.committer.name", &committer.name)?;
            if !committer.email.contains('@') {
                return Err(HandlerError::config(format!(
                    "repository.committer.email is not an e-mail address: '{}'",
                    committer.email
                )));
            }
        }
        Ok(())
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), HandlerError> {
    if value.trim().is_empty() {
        return Err(HandlerError::config(format!("{} must not be empty", field)));
    }
    Ok(())
}
