//! Request/response contract between the agent orchestrator and the handlers
//!
//! The orchestrator sends an action-group invocation (routing fields, a property
//! bag, session attributes) and correlates the reply through the routing fields,
//! so every envelope produced here echoes `actionGroup`, `apiPath` and
//! `httpMethod` unchanged and passes the session attributes through.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};

use crate::errors::HandlerError;

pub const MESSAGE_VERSION: &str = "1.0";
pub const JSON_MEDIA_TYPE: &str = "application/json";

pub const BUCKET_PROPERTY: &str = "diagramS3Bucket";
pub const KEY_PROPERTY: &str = "diagramS3Key";
pub const DRAFT_PROPERTY: &str = "final_draft";

/// Location of one diagram image in object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramReference {
    bucket: String,
    key: String,
}

impl DiagramReference {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Result<Self, HandlerError> {
        let bucket = bucket.into();
        let key = key.into();
        if bucket.trim().is_empty() {
            return Err(HandlerError::InvalidRequest(format!(
                "{} must not be empty",
                BUCKET_PROPERTY
            )));
        }
        if key.trim().is_empty() {
            return Err(HandlerError::InvalidRequest(format!(
                "{} must not be empty",
                KEY_PROPERTY
            )));
        }
        Ok(Self { bucket, key })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Display for DiagramReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(deserialize_with = "property_value")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaContent {
    #[serde(default)]
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub content: HashMap<String, MediaContent>,
}

/// One agent-initiated action-group call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_version: Option<String>,
    #[serde(default)]
    pub action_group: String,
    #[serde(default)]
    pub api_path: String,
    #[serde(default)]
    pub http_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub session_attributes: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub prompt_session_attributes: Map<String, Value>,
}

impl InvocationRequest {
    pub fn from_value(event: Value) -> Result<Self, HandlerError> {
        serde_json::from_value(event)
            .map_err(|e| HandlerError::InvalidRequest(format!("Malformed invocation event: {}", e)))
    }

    /// Best-effort extraction of the routing fields from an event that did not
    /// deserialize, so the failure envelope can still be correlated.
    pub fn routing_only(event: &Value) -> Self {
        let field = |name: &str| {
            event
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let attributes = |name: &str| {
            event
                .get(name)
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default()
        };
        Self {
            action_group: field("actionGroup"),
            api_path: field("apiPath"),
            http_method: field("httpMethod"),
            session_attributes: attributes("sessionAttributes"),
            prompt_session_attributes: attributes("promptSessionAttributes"),
            ..Default::default()
        }
    }

    /// The `application/json` property bag as name→value. Later duplicates win.
    pub fn properties(&self) -> HashMap<&str, &str> {
        self.request_body
            .as_ref()
            .and_then(|body| body.content.get(JSON_MEDIA_TYPE))
            .map(|content| {
                content
                    .properties
                    .iter()
                    .map(|p| (p.name.as_str(), p.value.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn property(&self, name: &str) -> Result<&str, HandlerError> {
        self.properties()
            .get(name)
            .copied()
            .ok_or_else(|| HandlerError::MissingProperty(name.to_string()))
    }

    pub fn diagram_reference(&self) -> Result<DiagramReference, HandlerError> {
        DiagramReference::new(self.property(BUCKET_PROPERTY)?, self.property(KEY_PROPERTY)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseBody {
    /// JSON document serialized as a string.
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub action_group: String,
    pub api_path: String,
    pub http_method: String,
    pub http_status_code: u16,
    pub response_body: BTreeMap<String, ResponseBody>,
    pub session_attributes: Map<String, Value>,
    pub prompt_session_attributes: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub message_version: String,
    pub response: ActionResponse,
}

impl ResponseEnvelope {
    pub fn new(request: &InvocationRequest, status: u16, body: &Value) -> Self {
        let mut response_body = BTreeMap::new();
        response_body.insert(
            JSON_MEDIA_TYPE.to_string(),
            ResponseBody {
                body: body.to_string(),
            },
        );

        Self {
            message_version: MESSAGE_VERSION.to_string(),
            response: ActionResponse {
                action_group: request.action_group.clone(),
                api_path: request.api_path.clone(),
                http_method: request.http_method.clone(),
                http_status_code: status,
                response_body,
                session_attributes: request.session_attributes.clone(),
                prompt_session_attributes: request.prompt_session_attributes.clone(),
            },
        }
    }

    pub fn success(request: &InvocationRequest, body: &Value) -> Self {
        Self::new(request, 200, body)
    }

    pub fn failure(request: &InvocationRequest, error: &HandlerError) -> Self {
        let body = json!({
            "error": error.summary(),
            "details": error.to_string(),
        });
        Self::new(request, error.status_code(), &body)
    }

    pub fn status_code(&self) -> u16 {
        self.response.http_status_code
    }

    /// The JSON body string, parsed back into a value.
    pub fn body(&self) -> Result<Value, HandlerError> {
        let raw = self
            .response
            .response_body
            .get(JSON_MEDIA_TYPE)
            .map(|b| b.body.as_str())
            .unwrap_or("null");
        Ok(serde_json::from_str(raw)?)
    }
}

/// Plain `{statusCode, headers?, body}` failure object, produced only when the
/// legacy error style is configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyErrorResponse {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    pub body: String,
}

/// What a handler hands back to the runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HandlerResponse {
    Envelope(ResponseEnvelope),
    Legacy(LegacyErrorResponse),
}

impl HandlerResponse {
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerResponse::Envelope(envelope) => envelope.status_code(),
            HandlerResponse::Legacy(legacy) => legacy.status_code,
        }
    }

    pub fn envelope(&self) -> Option<&ResponseEnvelope> {
        match self {
            HandlerResponse::Envelope(envelope) => Some(envelope),
            HandlerResponse::Legacy(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<ResponseEnvelope> for HandlerResponse {
    fn from(envelope: ResponseEnvelope) -> Self {
        HandlerResponse::Envelope(envelope)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

// Agents send every property value as a string; tolerate scalars from hand-written events.
fn property_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
