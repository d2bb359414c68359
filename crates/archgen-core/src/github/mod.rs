//! Publishing generated files to a hosted repository
//!
//! A publish is a read-before-write against the contents API: the current blob
//! sha of the target path is looked up first and sent back with the write, which
//! turns the write into an update; without a sha the write creates the file.

use async_trait::async_trait;
use base64::Engine;
use serde::Serialize;

use crate::config::{Committer, RepositoryConfig};
use crate::errors::HandlerError;

pub mod contents;

pub use contents::GitHubContentsClient;

#[async_trait]
pub trait RepositoryPublisher: Send + Sync {
    async fn create_and_commit_file(
        &self,
        request: &PublishRequest,
    ) -> Result<PublishOutcome, HandlerError>;
}

/// One file commit.
#[derive(Clone, PartialEq)]
pub struct PublishRequest {
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub token: String,
    pub message: String,
    pub content: String,
    pub branch: Option<String>,
    pub committer: Option<Committer>,
}

impl std::fmt::Debug for PublishRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishRequest")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("path", &self.path)
            .field("token", &"<redacted>")
            .field("message", &self.message)
            .field("content_len", &self.content.len())
            .field("branch", &self.branch)
            .field("committer", &self.committer)
            .finish()
    }
}

impl PublishRequest {
    /// Request for the configured repository coordinates.
    pub fn for_repository(
        repository: &RepositoryConfig,
        token: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            owner: repository.owner.clone(),
            repo: repository.name.clone(),
            path: repository.path.clone(),
            token: token.into(),
            message: repository.commit_message.clone(),
            content: content.into(),
            branch: repository.branch.clone(),
            committer: repository.committer.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub path: String,
    /// Whether the file did not exist before this commit.
    pub created: bool,
    pub previous_sha: Option<String>,
    pub commit_sha: Option<String>,
}

/// Body of a contents-API create-or-update request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentsPayload {
    message: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    committer: Option<Committer>,
}

impl ContentsPayload {
    /// `content` is the plain file text; it is base64-encoded here.
    pub fn new(message: &str, content: &str) -> Result<Self, HandlerError> {
        if message.trim().is_empty() {
            return Err(HandlerError::Publish {
                path: String::new(),
                message: "commit message is empty".to_string(),
            });
        }
        Ok(Self {
            message: message.to_string(),
            content: base64::engine::general_purpose::STANDARD.encode(content.as_bytes()),
            sha: None,
            branch: None,
            committer: None,
        })
    }

    pub fn with_sha(mut self, sha: Option<String>) -> Self {
        self.sha = sha;
        self
    }

    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }

    pub fn with_committer(mut self, committer: Option<Committer>) -> Self {
        self.committer = committer;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_for_new_file_omits_sha() {
        let payload = ContentsPayload::new("Initial terraform code", "resource \"x\" {}").unwrap();
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "message": "Initial terraform code",
                "content": "cmVzb3VyY2UgIngiIHt9"
            })
        );
    }

    #[test]
    fn test_payload_for_update_carries_sha_and_metadata() {
        let payload = ContentsPayload::new("Initial terraform code", "x")
            .unwrap()
            .with_sha(Some("abc123".to_string()))
            .with_branch(Some("iac".to_string()))
            .with_committer(Some(Committer {
                name: "IaC Bot".to_string(),
                email: "bot@example.com".to_string(),
            }));
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["sha"], "abc123");
        assert_eq!(value["branch"], "iac");
        assert_eq!(value["committer"]["email"], "bot@example.com");
    }

    #[test]
    fn test_payload_rejects_empty_message() {
        assert!(ContentsPayload::new("  ", "x").is_err());
    }

    #[test]
    fn test_request_debug_redacts_token() {
        let request =
            PublishRequest::for_repository(&RepositoryConfig::default(), "ghp_secret", "x");
        let debug = format!("{:?}", request);
        assert!(!debug.contains("ghp_secret"));
        assert_eq!(request.path, "test/main.tf");
        assert_eq!(request.message, "Initial terraform code");
    }
}
