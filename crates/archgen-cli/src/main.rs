//! Local driver for the action-group handlers
//!
//! Replays a saved invocation event through either handler against the real
//! AWS and GitHub clients, and prints the prompts and configuration the
//! handlers would use.

use anyhow::{Context, Result};
use archgen_core::config::{ArchgenConfig, ConfigLoader, IacLanguage};
use archgen_core::llm::prompt::{generation_prompt, ANALYSIS_PROMPT};
use archgen_core::rag::ModuleDefinitions;
use archgen_core::{DiagramAnalyzer, HandlerKind, IacGenerator, ServiceContext};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "archgen - drive the diagram analyzer and IaC generator locally")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(
        long,
        short,
        global = true,
        help = "YAML configuration file (defaults to $ARCHGEN_CONFIG or built-in values)"
    )]
    config: Option<PathBuf>,

    #[clap(long, short, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one handler on a saved invocation event
    Invoke {
        #[clap(long, help = "analyzer or generator")]
        handler: String,

        #[clap(long, short, help = "Path to the invocation event JSON")]
        event: PathBuf,
    },
    /// Print the prompt text a handler sends to the model
    RenderPrompt {
        #[clap(long, help = "Final draft; when omitted the analysis prompt is printed")]
        draft: Option<String>,

        #[clap(long, help = "File with module definitions to embed")]
        definitions: Option<PathBuf>,

        #[clap(long, help = "terraform or cloudformation (defaults to the configured language)")]
        language: Option<String>,
    },
    /// Print the effective configuration as YAML
    PrintConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level_filter = cli.log_level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();

    let config = load_config(cli.config.as_ref()).await?;

    match cli.command {
        Commands::Invoke { handler, event } => invoke(config, &handler, &event).await,
        Commands::RenderPrompt {
            draft,
            definitions,
            language,
        } => render_prompt(&config, draft, definitions, language).await,
        Commands::PrintConfig => {
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        }
    }
}

async fn load_config(path: Option<&PathBuf>) -> Result<ArchgenConfig> {
    let config = match path {
        Some(path) => {
            log::info!("Loading configuration from file: {}", path.display());
            ConfigLoader::from_file(path).await?
        }
        None => ConfigLoader::from_env().await?,
    };
    Ok(config)
}

async fn invoke(config: ArchgenConfig, handler: &str, event_path: &PathBuf) -> Result<()> {
    let kind = HandlerKind::parse(handler).ok_or_else(|| {
        anyhow::anyhow!("Unknown handler '{}', expected analyzer or generator", handler)
    })?;

    let raw = tokio::fs::read_to_string(event_path)
        .await
        .with_context(|| format!("Failed to read event file {}", event_path.display()))?;
    let event: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Event file {} is not valid JSON", event_path.display()))?;

    let context = ServiceContext::with_config(config).await?;
    log::info!("Invoking {}", kind);

    let response = match kind {
        HandlerKind::Analyzer => DiagramAnalyzer::from_context(&context).handle_event(event).await,
        HandlerKind::Generator => IacGenerator::from_context(&context).handle_event(event).await,
    };

    println!("{}", serde_json::to_string_pretty(&response.to_value())?);
    if response.status_code() >= 400 {
        anyhow::bail!("{} returned HTTP {}", kind, response.status_code());
    }
    Ok(())
}

async fn render_prompt(
    config: &ArchgenConfig,
    draft: Option<String>,
    definitions: Option<PathBuf>,
    language: Option<String>,
) -> Result<()> {
    let Some(draft) = draft else {
        println!("{}", ANALYSIS_PROMPT);
        return Ok(());
    };

    let language = match language {
        Some(value) => IacLanguage::parse(&value)
            .ok_or_else(|| anyhow::anyhow!("Unknown IaC language '{}'", value))?,
        None => config.iac.language,
    };

    let definitions = match definitions {
        Some(path) => ModuleDefinitions::from_text(
            tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read definitions file {}", path.display()))?,
        ),
        None => ModuleDefinitions::Empty,
    };

    println!("{}", generation_prompt(language, &draft, &definitions));
    Ok(())
}
