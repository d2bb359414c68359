use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;

use crate::errors::HandlerError;
use crate::invocation::DiagramReference;
use crate::storage::ObjectStore;

#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_sdk_config(config: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, reference: &DiagramReference) -> Result<Vec<u8>, HandlerError> {
        log::info!("Fetching diagram {}", reference);

        let output = self
            .client
            .get_object()
            .bucket(reference.bucket())
            .key(reference.key())
            .send()
            .await
            .map_err(|e| HandlerError::ObjectFetch(DisplayErrorContext(&e).to_string()))?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| HandlerError::ObjectFetch(format!("Failed to read object body: {}", e)))?
            .into_bytes();

        log::debug!("Fetched {} bytes from {}", bytes.len(), reference);
        Ok(bytes.to_vec())
    }
}
