//! services/api/src/adapters/description_llm.rs
//!
//! This module contains the adapter for the description-writing LLM.
//! It implements the `DescriptionGenerationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use lifedeal_core::ports::{DescriptionGenerationService, PortError, PortResult};
use tracing::debug;

const SYSTEM_PROMPT: &str = "You write short product blurbs for a personal catalogue of \
lifetime software deals. Given a product name, reply with one or two plain sentences \
describing what the product does and who it is for. No markdown, no quotes, no pricing.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `DescriptionGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiDescriptionAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiDescriptionAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `DescriptionGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DescriptionGenerationService for OpenAiDescriptionAdapter {
    async fn generate_description(&self, deal_name: &str) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!("PRODUCT: {}", deal_name))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        debug!("Requesting description for '{}' from {}", deal_name, self.model);
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unavailable(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                PortError::Unexpected(
                    "Description LLM response contained no text content.".to_string(),
                )
            })
    }
}
