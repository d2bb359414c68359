//! Object storage access for diagram images.

use async_trait::async_trait;

use crate::errors::HandlerError;
use crate::invocation::DiagramReference;

pub mod s3;

pub use s3::S3ObjectStore;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Full object body. Any failure (missing object, access denied, network)
    /// is reported as [`HandlerError::ObjectFetch`].
    async fn get_object(&self, reference: &DiagramReference) -> Result<Vec<u8>, HandlerError>;
}
