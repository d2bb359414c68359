//! Shared start-up for the Lambda entry points.

use archgen_core::ServiceContext;

/// Initialise `env_logger` from `RUST_LOG`, defaulting to `info`.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

/// Build the process-wide clients once, before the first invocation.
pub async fn cold_start(handler: &str) -> Result<ServiceContext, lambda_runtime::Error> {
    init_logging();
    let context = ServiceContext::from_env().await?;
    log::info!(
        "{} ready (model {}, target {}/{}:{})",
        handler,
        context.config.model.model_id,
        context.config.repository.owner,
        context.config.repository.name,
        context.config.repository.path
    );
    Ok(context)
}
