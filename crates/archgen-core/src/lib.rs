//! Agent action-group handlers that turn an architecture diagram into
//! Infrastructure-as-Code.
//!
//! Two handlers are exposed to the agent orchestrator:
//!
//! - **Diagram analysis** ([`DiagramAnalyzer`]): fetches the diagram image from
//!   object storage and asks a multimodal model for a structured summary plus
//!   the clarifying questions needed before code can be written.
//! - **IaC generation** ([`IacGenerator`]): enriches the prompt with module
//!   definitions from a knowledge base, asks the model for code matching the
//!   diagram and the agreed draft, and commits the result to a GitHub
//!   repository.
//!
//! Every external dependency sits behind a trait ([`ObjectStore`],
//! [`InferenceService`], [`RetrievalService`], [`RepositoryPublisher`]) so the
//! handlers can be driven by the AWS/GitHub clients of a [`ServiceContext`] or
//! by test doubles.

pub mod config;
pub mod context;
pub mod errors;
pub mod github;
pub mod handlers;
pub mod invocation;
pub mod llm;
pub mod policy;
pub mod rag;
pub mod storage;

pub use config::{ArchgenConfig, ConfigLoader, Secrets};
pub use context::ServiceContext;
pub use errors::HandlerError;
pub use github::RepositoryPublisher;
pub use handlers::{DiagramAnalyzer, HandlerKind, IacGenerator};
pub use invocation::{HandlerResponse, InvocationRequest, ResponseEnvelope};
pub use llm::InferenceService;
pub use policy::{Dependency, FailurePolicy, PolicyTable};
pub use rag::RetrievalService;
pub use storage::ObjectStore;

#[cfg(test)]
pub mod test_utils;
