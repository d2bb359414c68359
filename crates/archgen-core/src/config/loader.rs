//! Configuration loading and environment resolution
//!
//! Configuration is loaded once per process: compiled-in defaults, then an
//! optional YAML file named by `ARCHGEN_CONFIG`, then a handful of `ARCHGEN_*`
//! overrides. Secrets are deliberately not part of the loaded configuration; they
//! are read from the environment on every invocation through [`Secrets`].

use std::env;
use std::path::Path;

use crate::errors::HandlerError;

use super::types::{ArchgenConfig, ErrorStyle, IacLanguage};

/// Environment variable naming an optional YAML configuration file.
pub const CONFIG_PATH_ENV: &str = "ARCHGEN_CONFIG";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the process configuration from the environment.
    pub async fn from_env() -> Result<ArchgenConfig, HandlerError> {
        let mut config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                log::info!("Loading configuration from {}", path);
                Self::read_file(&path).await?
            }
            _ => {
                log::debug!("{} not set, using built-in configuration", CONFIG_PATH_ENV);
                ArchgenConfig::default()
            }
        };

        Self::apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<ArchgenConfig, HandlerError> {
        let config = Self::read_file(path).await?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_str(content: &str) -> Result<ArchgenConfig, HandlerError> {
        let config = Self::parse(content)?;
        config.validate()?;
        Ok(config)
    }

    async fn read_file<P: AsRef<Path>>(path: P) -> Result<ArchgenConfig, HandlerError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            HandlerError::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<ArchgenConfig, HandlerError> {
        // An empty document means "all defaults".
        if content.trim().is_empty() {
            return Ok(ArchgenConfig::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| HandlerError::config(format!("Failed to parse YAML config: {}", e)))
    }

    fn apply_env_overrides(config: &mut ArchgenConfig) -> Result<(), HandlerError> {
        if let Some(owner) = non_empty_var("ARCHGEN_REPOSITORY_OWNER") {
            config.repository.owner = owner;
        }
        if let Some(name) = non_empty_var("ARCHGEN_REPOSITORY_NAME") {
            config.repository.name = name;
        }
        if let Some(path) = non_empty_var("ARCHGEN_REPOSITORY_PATH") {
            config.repository.path = path;
        }
        if let Some(branch) = non_empty_var("ARCHGEN_REPOSITORY_BRANCH") {
            config.repository.branch = Some(branch);
        }
        if let Some(model_id) = non_empty_var("ARCHGEN_MODEL_ID") {
            config.model.model_id = model_id;
        }
        if let Some(language) = non_empty_var("ARCHGEN_IAC_LANGUAGE") {
            config.iac.language = IacLanguage::parse(&language).ok_or_else(|| {
                HandlerError::config(format!("Unknown IaC language '{}'", language))
            })?;
        }
        if let Some(style) = non_empty_var("ARCHGEN_ERROR_STYLE") {
            config.responses.error_style = match style.to_ascii_lowercase().as_str() {
                "unified" => ErrorStyle::Unified,
                "legacy" => ErrorStyle::Legacy,
                other => {
                    return Err(HandlerError::config(format!(
                        "Unknown error style '{}', expected 'unified' or 'legacy'",
                        other
                    )))
                }
            };
        }
        Ok(())
    }
}

/// Credentials and identifiers read from the environment at invocation time.
#[derive(Clone)]
pub struct Secrets {
    pub github_token: String,
    pub knowledge_base_id: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("github_token", &"<redacted>")
            .field("knowledge_base_id", &self.knowledge_base_id)
            .finish()
    }
}

impl Secrets {
    pub fn resolve(config: &ArchgenConfig) -> Result<Self, HandlerError> {
        let github_token = required_var(&config.repository.token_env)?;
        let knowledge_base_id = required_var(&config.retrieval.knowledge_base_id_env)?;
        Ok(Self {
            github_token,
            knowledge_base_id,
        })
    }
}

fn required_var(name: &str) -> Result<String, HandlerError> {
    non_empty_var(name)
        .ok_or_else(|| HandlerError::config(format!("Environment variable {} is not set", name)))
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
