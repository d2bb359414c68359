//! Action-group handlers
//!
//! Each handler turns one invocation event into one [`HandlerResponse`]. Events
//! that do not deserialize and every pipeline failure are rendered through
//! [`render_failure`], so a handler never returns an error to the runtime.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{json, Value};

use crate::config::ErrorStyle;
use crate::errors::HandlerError;
use crate::invocation::{
    HandlerResponse, InvocationRequest, LegacyErrorResponse, ResponseEnvelope, JSON_MEDIA_TYPE,
};

pub mod analyzer;
pub mod generator;

pub use analyzer::DiagramAnalyzer;
pub use generator::IacGenerator;

const GENERIC_FAILURE: &str = "An error occurred during the process.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Analyzer,
    Generator,
}

impl HandlerKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "analyzer" | "analyze" | "diagram-analyzer" => Some(HandlerKind::Analyzer),
            "generator" | "generate" | "iac-generator" => Some(HandlerKind::Generator),
            _ => None,
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerKind::Analyzer => f.write_str("diagram-analyzer"),
            HandlerKind::Generator => f.write_str("iac-generator"),
        }
    }
}

/// Render a failure in the configured response shape.
pub fn render_failure(
    style: ErrorStyle,
    kind: HandlerKind,
    request: &InvocationRequest,
    error: &HandlerError,
) -> HandlerResponse {
    match style {
        ErrorStyle::Unified => ResponseEnvelope::failure(request, error).into(),
        ErrorStyle::Legacy => HandlerResponse::Legacy(legacy_failure(kind, error)),
    }
}

fn legacy_failure(kind: HandlerKind, error: &HandlerError) -> LegacyErrorResponse {
    match kind {
        HandlerKind::Analyzer => LegacyErrorResponse {
            status_code: 500,
            headers: None,
            body: Value::String(error.to_string()).to_string(),
        },
        HandlerKind::Generator => {
            let mut headers = BTreeMap::new();
            headers.insert("Content-Type".to_string(), JSON_MEDIA_TYPE.to_string());
            LegacyErrorResponse {
                status_code: 500,
                headers: Some(headers),
                body: json!({
                    "error": GENERIC_FAILURE,
                    "details": error.to_string(),
                })
                .to_string(),
            }
        }
    }
}

/// Deserialize `event`, or render the failure against its routing fields.
pub(crate) fn parse_event(
    style: ErrorStyle,
    kind: HandlerKind,
    event: Value,
) -> Result<InvocationRequest, HandlerResponse> {
    log::debug!("{} received event: {}", kind, event);
    match InvocationRequest::from_value(event.clone()) {
        Ok(request) => Ok(request),
        Err(err) => {
            log::error!("{} rejected event: {}", kind, err);
            let routing = InvocationRequest::routing_only(&event);
            Err(render_failure(style, kind, &routing, &err))
        }
    }
}
