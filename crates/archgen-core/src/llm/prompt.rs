//! Image + text prompt construction for the Messages API on Bedrock
//!
//! Every prompt is one user turn holding the diagram as a base64 image part
//! followed by one instruction text part. The builder validates the pieces
//! before anything is sent over the wire.

use base64::Engine;
use serde::Serialize;

use crate::config::{IacLanguage, SamplingParameters};
use crate::errors::HandlerError;
use crate::rag::ModuleDefinitions;

pub const PNG_MEDIA_TYPE: &str = "image/png";

pub const ANALYSIS_PROMPT: &str = "Please analyze this architecture diagram in order to create Infrastructure-As-Code. Please provide a structured summary of the diagram and ask necessary questions about missing configuration components, dependencies, or unclear connections that are not present in the diagram and that are required to create the IaC. DO NOT assume or ask additional unrelated questions";

/// Code-generation instruction for `draft`, with the retrieved module
/// definitions embedded as a JSON literal.
pub fn generation_prompt(
    language: IacLanguage,
    draft: &str,
    definitions: &ModuleDefinitions,
) -> String {
    let language = language.display_name();
    let mut prompt = format!(
        "Please analyze the architecture diagram in order to create Infrastructure-As-Code. \
         Please use {} and create the necessary IaC in {}: ",
        draft, language
    );
    prompt.push_str(". Use the following module definitions wherever applicable: ");
    prompt.push_str(&definitions.to_prompt_literal());
    prompt.push_str(&format!(" Give only {} code as the output response.", language));
    prompt
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelPrompt {
    anthropic_version: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    messages: Vec<PromptMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct PromptMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentPart {
    Image { source: ImageSource },
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'static str,
    data: String,
}

impl ModelPrompt {
    pub fn to_bytes(&self) -> Result<Vec<u8>, HandlerError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn sampling(&self) -> Option<SamplingParameters> {
        match (self.temperature, self.top_k, self.top_p) {
            (Some(temperature), Some(top_k), Some(top_p)) => Some(SamplingParameters {
                temperature,
                top_k,
                top_p,
            }),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.parts().find_map(|part| match part {
            ContentPart::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Base64 image payload.
    pub fn image_data(&self) -> Option<&str> {
        self.parts().find_map(|part| match part {
            ContentPart::Image { source } => Some(source.data.as_str()),
            _ => None,
        })
    }

    fn parts(&self) -> impl Iterator<Item = &ContentPart> {
        self.messages.iter().flat_map(|m| m.content.iter())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImagePromptBuilder {
    anthropic_version: String,
    max_tokens: u32,
    sampling: Option<SamplingParameters>,
    image: Option<Vec<u8>>,
    text: Option<String>,
}

impl ImagePromptBuilder {
    pub fn new(anthropic_version: impl Into<String>) -> Self {
        Self {
            anthropic_version: anthropic_version.into(),
            max_tokens: 4096,
            ..Default::default()
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn sampling(mut self, sampling: SamplingParameters) -> Self {
        self.sampling = Some(sampling);
        self
    }

    /// Raw PNG bytes; encoded when the prompt is built.
    pub fn png(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.image = Some(bytes.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn build(self) -> Result<ModelPrompt, HandlerError> {
        if self.anthropic_version.trim().is_empty() {
            return Err(HandlerError::Prompt("protocol version tag is empty".to_string()));
        }
        if self.max_tokens == 0 {
            return Err(HandlerError::Prompt("max_tokens must be greater than 0".to_string()));
        }
        let image = match self.image {
            Some(bytes) if !bytes.is_empty() => bytes,
            Some(_) => return Err(HandlerError::Prompt("diagram image is empty".to_string())),
            None => return Err(HandlerError::Prompt("diagram image is missing".to_string())),
        };
        let text = match self.text {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Err(HandlerError::Prompt("instruction text is missing".to_string())),
        };
        if let Some(sampling) = &self.sampling {
            if !(0.0..=1.0).contains(&sampling.temperature) {
                return Err(HandlerError::Prompt(format!(
                    "temperature {} is outside 0..=1",
                    sampling.temperature
                )));
            }
            if !(0.0..=1.0).contains(&sampling.top_p) {
                return Err(HandlerError::Prompt(format!(
                    "top_p {} is outside 0..=1",
                    sampling.top_p
                )));
            }
        }

        let data = base64::engine::general_purpose::STANDARD.encode(&image);

        Ok(ModelPrompt {
            anthropic_version: self.anthropic_version,
            max_tokens: self.max_tokens,
            temperature: self.sampling.map(|s| s.temperature),
            top_k: self.sampling.map(|s| s.top_k),
            top_p: self.sampling.map(|s| s.top_p),
            messages: vec![PromptMessage {
                role: "user",
                content: vec![
                    ContentPart::Image {
                        source: ImageSource {
                            kind: "base64",
                            media_type: PNG_MEDIA_TYPE,
                            data,
                        },
                    },
                    ContentPart::Text { text },
                ],
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn test_analysis_prompt_body() {
        let prompt = ImagePromptBuilder::new("bedrock-2023-05-31")
            .png(PNG_HEADER)
            .text(ANALYSIS_PROMPT)
            .build()
            .unwrap();

        let body: serde_json::Value = serde_json::from_slice(&prompt.to_bytes().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "anthropic_version": "bedrock-2023-05-31",
                "max_tokens": 4096,
                "messages": [{
                    "role": "user",
                    "content": [
                        {
                            "type": "image",
                            "source": {
                                "type": "base64",
                                "media_type": "image/png",
                                "data": "iVBORw0KGgo="
                            }
                        },
                        {"type": "text", "text": ANALYSIS_PROMPT}
                    ]
                }]
            })
        );
        assert!(prompt.sampling().is_none());
    }

    #[test]
    fn test_generation_prompt_carries_sampling() {
        let prompt = ImagePromptBuilder::new("bedrock-2023-05-31")
            .sampling(SamplingParameters::default())
            .png(PNG_HEADER)
            .text("generate")
            .build()
            .unwrap();

        let body: serde_json::Value = serde_json::from_slice(&prompt.to_bytes().unwrap()).unwrap();
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["top_k"], 250);
        assert_eq!(body["top_p"], 1.0);
        assert_eq!(prompt.sampling(), Some(SamplingParameters::default()));
        assert_eq!(prompt.text(), Some("generate"));
        assert_eq!(prompt.image_data(), Some("iVBORw0KGgo="));
    }

    #[test]
    fn test_builder_rejects_missing_parts() {
        let no_image = ImagePromptBuilder::new("bedrock-2023-05-31").text("hi").build();
        assert!(matches!(no_image, Err(HandlerError::Prompt(_))));

        let empty_image = ImagePromptBuilder::new("bedrock-2023-05-31")
            .png(Vec::new())
            .text("hi")
            .build();
        assert!(matches!(empty_image, Err(HandlerError::Prompt(_))));

        let no_text = ImagePromptBuilder::new("bedrock-2023-05-31").png(PNG_HEADER).build();
        assert!(matches!(no_text, Err(HandlerError::Prompt(_))));

        let zero_tokens = ImagePromptBuilder::new("bedrock-2023-05-31")
            .max_tokens(0)
            .png(PNG_HEADER)
            .text("hi")
            .build();
        assert!(matches!(zero_tokens, Err(HandlerError::Prompt(_))));
    }

    #[test]
    fn test_builder_rejects_out_of_range_sampling() {
        let result = ImagePromptBuilder::new("bedrock-2023-05-31")
            .sampling(SamplingParameters {
                temperature: 2.0,
                top_k: 250,
                top_p: 1.0,
            })
            .png(PNG_HEADER)
            .text("hi")
            .build();
        assert!(matches!(result, Err(HandlerError::Prompt(_))));
    }

    #[test]
    fn test_generation_prompt_with_definitions() {
        let definitions = ModuleDefinitions::from_text(
            "module \"sqs\" { source = \"terraform-aws-modules/sqs/aws\" }",
        );
        let prompt = generation_prompt(
            IacLanguage::Terraform,
            "use a managed queue and a compute function",
            &definitions,
        );

        assert!(prompt.contains(
            "Please use use a managed queue and a compute function \
             and create the necessary IaC in Terraform: "
        ));
        assert!(prompt.contains(
            r#"wherever applicable: "module \"sqs\" { source = \"terraform-aws-modules/sqs/aws\" }""#
        ));
        assert!(prompt.ends_with(" Give only Terraform code as the output response."));
    }

    #[test]
    fn test_generation_prompt_without_definitions() {
        let prompt = generation_prompt(
            IacLanguage::CloudFormation,
            "a queue",
            &ModuleDefinitions::Empty,
        );
        assert!(prompt.contains("wherever applicable: {} Give only CloudFormation code"));
        assert!(prompt.contains("create the necessary IaC in CloudFormation: "));
    }
}
