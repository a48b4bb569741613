//! services/api/src/adapters/vision_llm.rs
//!
//! This module contains the adapter for the vision-capable LLM.
//! It implements the `VisionAnalysisService` port from the `core` crate against any
//! OpenAI-compatible chat completions endpoint (OpenAI itself, or Gemini's
//! OpenAI endpoint when configured with its base URL).

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs,
        ImageUrlArgs, ResponseFormat, ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use plant_doctor_core::{
    diagnosis::diagnosis_response_schema,
    ports::{PortError, PortResult, VisionAnalysisService},
    EncodedImage,
};
use tracing::debug;

use crate::config::VisionCredentials;

const SCHEMA_NAME: &str = "plant_diagnosis";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `VisionAnalysisService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiVisionAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiVisionAdapter {
    /// Creates a new `OpenAiVisionAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Builds the client from the configured key and optional endpoint.
    pub fn from_credentials(credentials: &VisionCredentials, model: String) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(credentials.api_key.as_str());
        if let Some(base) = &credentials.api_base {
            config = config.with_api_base(base.as_str());
        }
        Self::new(Client::with_config(config), model)
    }
}

//=========================================================================================
// `VisionAnalysisService` Trait Implementation
//=========================================================================================

#[async_trait]
impl VisionAnalysisService for OpenAiVisionAdapter {
    /// Sends the image as an inline data URI together with the instruction, and asks
    /// for a response constrained to the diagnosis JSON schema.
    async fn analyze_image(&self, image: &EncodedImage, instruction: &str) -> PortResult<String> {
        let parts: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
            ChatCompletionRequestMessageContentPartImageArgs::default()
                .image_url(
                    ImageUrlArgs::default()
                        .url(image.to_data_uri())
                        .build()
                        .map_err(|e| PortError::Unexpected(e.to_string()))?,
                )
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestMessageContentPartTextArgs::default()
                .text(instruction)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let messages = vec![ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(parts)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?,
        )];

        // Optional fields (diseaseName, confidence) rule out strict mode.
        let response_format = ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: Some("Plant identification and health diagnosis".to_string()),
                name: SCHEMA_NAME.to_string(),
                schema: Some(diagnosis_response_schema()),
                strict: Some(false),
            },
        };

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(response_format)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        debug!(
            model = %self.model,
            mime_type = image.mime_type(),
            image_bytes = image.bytes().len(),
            "Requesting diagnosis"
        );

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        // Extract the text content from the first choice in the response.
        response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| {
                PortError::Unexpected("Vision LLM returned no choices in its response.".to_string())
            })?
            .message
            .content
            .ok_or_else(|| {
                PortError::Unexpected("Vision LLM response contained no text content.".to_string())
            })
    }
}
