//! Lambda entry point for diagram analysis.

use std::sync::Arc;

use archgen_core::DiagramAnalyzer;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let context = archgen_lambda::cold_start("diagram-analyzer").await?;
    let analyzer = Arc::new(DiagramAnalyzer::from_context(&context));

    run(service_fn(move |event: LambdaEvent<Value>| {
        let analyzer = analyzer.clone();
        async move {
            log::debug!("Request id {}", event.context.request_id);
            Ok::<Value, Error>(analyzer.handle_event(event.payload).await.to_value())
        }
    }))
    .await
}
