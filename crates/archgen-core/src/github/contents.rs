//! GitHub contents API client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;

use crate::config::RepositoryConfig;
use crate::errors::HandlerError;
use crate::github::{ContentsPayload, PublishOutcome, PublishRequest, RepositoryPublisher};

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    sha: String,
}

#[derive(Debug, Default, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    commit: Option<CommitInfo>,
}

#[derive(Debug, Deserialize)]
struct CommitInfo {
    sha: String,
}

pub struct GitHubContentsClient {
    client: reqwest::Client,
    api_base: String,
}

impl GitHubContentsClient {
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self, HandlerError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("archgen/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| HandlerError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.into(),
        })
    }

    pub fn from_config(repository: &RepositoryConfig) -> Result<Self, HandlerError> {
        Self::new(
            repository.api_base.clone(),
            Duration::from_secs(repository.timeout_seconds),
        )
    }

    pub fn contents_url(&self, owner: &str, repo: &str, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base.trim_end_matches('/'),
            owner,
            repo,
            path
        )
    }

    fn authorized(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder
            .header("Authorization", format!("token {}", token))
            .header("Accept", "application/json")
    }

    /// Current blob sha of the target path, or `None` when the file does not exist.
    pub async fn lookup_sha(
        &self,
        request: &PublishRequest,
    ) -> Result<Option<String>, HandlerError> {
        let url = self.contents_url(&request.owner, &request.repo, &request.path);
        let mut builder = self.authorized(self.client.get(&url), &request.token);
        if let Some(branch) = &request.branch {
            builder = builder.query(&[("ref", branch)]);
        }

        let response = builder.send().await.map_err(|e| publish_error(request, e))?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            log::debug!(
                "{} does not exist yet in {}/{}",
                request.path,
                request.owner,
                request.repo
            );
            return Ok(None);
        }
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(HandlerError::Publish {
                path: request.path.clone(),
                message: format!("lookup returned HTTP {}: {}", status, body),
            });
        }

        let entry: ContentsEntry = response.json().await.map_err(|e| HandlerError::Publish {
            path: request.path.clone(),
            message: format!("lookup response is not a file entry: {}", e),
        })?;
        Ok(Some(entry.sha))
    }

    async fn put_contents(
        &self,
        request: &PublishRequest,
        payload: &ContentsPayload,
    ) -> Result<Option<String>, HandlerError> {
        let url = self.contents_url(&request.owner, &request.repo, &request.path);
        let response = self
            .authorized(self.client.put(&url), &request.token)
            .json(payload)
            .send()
            .await
            .map_err(|e| publish_error(request, e))?;

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            log::info!("{} successfully created/updated in GitHub repo.", request.path);
            let commit = response.json::<CommitResponse>().await.unwrap_or_default();
            return Ok(commit.commit.map(|c| c.sha));
        }

        let body = response.text().await.unwrap_or_default();
        log::error!("Failed to create/update {}: HTTP {} {}", request.path, status, body);
        Err(HandlerError::Publish {
            path: request.path.clone(),
            message: format!("write returned HTTP {}: {}", status, body),
        })
    }
}

#[async_trait]
impl RepositoryPublisher for GitHubContentsClient {
    async fn create_and_commit_file(
        &self,
        request: &PublishRequest,
    ) -> Result<PublishOutcome, HandlerError> {
        let previous_sha = self.lookup_sha(request).await?;

        let payload = ContentsPayload::new(&request.message, &request.content)?
            .with_sha(previous_sha.clone())
            .with_branch(request.branch.clone())
            .with_committer(request.committer.clone());

        let commit_sha = self.put_contents(request, &payload).await?;

        Ok(PublishOutcome {
            path: request.path.clone(),
            created: previous_sha.is_none(),
            previous_sha,
            commit_sha,
        })
    }
}

fn publish_error(request: &PublishRequest, err: reqwest::Error) -> HandlerError {
    HandlerError::Publish {
        path: request.path.clone(),
        message: err.to_string(),
    }
}
