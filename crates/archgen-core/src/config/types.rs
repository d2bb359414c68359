//! Configuration type definitions for the action-group handlers
//!
//! Every field has a compiled-in default, so an empty YAML document (or no file
//! at all) yields the constants the handlers were originally deployed with. A
//! deployment overrides only what differs, typically the repository coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-sonnet-20240229-v1:0";
pub const DEFAULT_ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
pub const DEFAULT_RETRIEVAL_MODEL_ARN: &str =
    "arn:aws:bedrock:us-east-1::foundation-model/anthropic.claude-v2";
pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_GITHUB_WEB_BASE: &str = "https://github.com";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchgenConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub iac: IacConfig,
    #[serde(default)]
    pub responses: ResponseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default = "default_anthropic_version")]
    pub anthropic_version: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling used for code generation. Diagram analysis sends none.
    #[serde(default)]
    pub generation: SamplingParameters,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            anthropic_version: default_anthropic_version(),
            max_tokens: default_max_tokens(),
            generation: SamplingParameters::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParameters {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
}

impl Default for SamplingParameters {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_k: 250,
            top_p: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Environment variable holding the knowledge base id.
    #[serde(default = "default_knowledge_base_id_env")]
    pub knowledge_base_id_env: String,
    /// Model the retrieval service uses to synthesize its answer.
    #[serde(default = "default_retrieval_model_arn")]
    pub model_arn: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            knowledge_base_id_env: default_knowledge_base_id_env(),
            model_arn: default_retrieval_model_arn(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default = "default_repo_owner")]
    pub owner: String,
    #[serde(default = "default_repo_name")]
    pub name: String,
    #[serde(default = "default_target_path")]
    pub path: String,
    /// Target branch. When unset the platform's default branch receives the
    /// commit and web links point at `main`.
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
    #[serde(default)]
    pub committer: Option<Committer>,
    /// Environment variable holding the access token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_web_base")]
    pub web_base: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            owner: default_repo_owner(),
            name: default_repo_name(),
            path: default_target_path(),
            branch: None,
            commit_message: default_commit_message(),
            committer: None,
            token_env: default_token_env(),
            api_base: default_api_base(),
            web_base: default_web_base(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl RepositoryConfig {
    /// Branch used in web links to the committed file.
    pub fn link_branch(&self) -> &str {
        self.branch.as_deref().unwrap_or("main")
    }

    /// Browser URL of the target file, e.g.
    /// `https://github.com/owner/repo/blob/main/test/main.tf`.
    pub fn file_web_url(&self) -> String {
        format!(
            "{}/{}/{}/blob/{}/{}",
            self.web_base.trim_end_matches('/'),
            self.owner,
            self.name,
            self.link_branch(),
            self.path
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Committer {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IacConfig {
    #[serde(default)]
    pub language: IacLanguage,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IacLanguage {
    #[default]
    Terraform,
    #[serde(alias = "cfn")]
    CloudFormation,
}

impl IacLanguage {
    pub fn display_name(&self) -> &'static str {
        match self {
            IacLanguage::Terraform => "Terraform",
            IacLanguage::CloudFormation => "CloudFormation",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "terraform" | "tf" => Some(IacLanguage::Terraform),
            "cloudformation" | "cfn" => Some(IacLanguage::CloudFormation),
            _ => None,
        }
    }
}

impl fmt::Display for IacLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseConfig {
    #[serde(default)]
    pub error_style: ErrorStyle,
}

/// Shape of failure responses.
///
/// `Unified` reuses the success envelope with an error status. `Legacy`
/// reproduces the plain `{statusCode, body}` objects older orchestrator
/// integrations were written against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStyle {
    #[default]
    Unified,
    Legacy,
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

fn default_anthropic_version() -> String {
    DEFAULT_ANTHROPIC_VERSION.to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_knowledge_base_id_env() -> String {
    "KNOWLEDGE_BASE_ID".to_string()
}

fn default_retrieval_model_arn() -> String {
    DEFAULT_RETRIEVAL_MODEL_ARN.to_string()
}

fn default_repo_owner() -> String {
    "input-repo-owner-name".to_string()
}

fn default_repo_name() -> String {
    "input-repo-name".to_string()
}

fn default_target_path() -> String {
    "test/main.tf".to_string()
}

fn default_commit_message() -> String {
    "Initial terraform code".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_api_base() -> String {
    DEFAULT_GITHUB_API_BASE.to_string()
}

fn default_web_base() -> String {
    DEFAULT_GITHUB_WEB_BASE.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}
