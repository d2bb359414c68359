//! Lambda entry point for IaC generation and publishing.

use std::sync::Arc;

use archgen_core::IacGenerator;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let context = archgen_lambda::cold_start("iac-generator").await?;
    let generator = Arc::new(IacGenerator::from_context(&context));

    run(service_fn(move |event: LambdaEvent<Value>| {
        let generator = generator.clone();
        async move {
            log::debug!("Request id {}", event.context.request_id);
            Ok::<Value, Error>(generator.handle_event(event.payload).await.to_value())
        }
    }))
    .await
}
