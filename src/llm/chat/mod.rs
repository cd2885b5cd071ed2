pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use serde::{ Deserialize, Serialize };
use std::sync::Arc;
use super::{ LlmConfig, LlmType };
use self::ollama::OllamaClient;
use self::openai::OpenAIChatClient;
use crate::error::LlmError;
use crate::models::chat::{ ChatMessage, Role };

/// Returned when the provider answers without any usable content.
pub const FALLBACK_REPLY: &str = "No response from AI.";

/// One entry of the message list sent to a completion API.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }
}

impl From<&ChatMessage> for PromptMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self { role: msg.role, content: msg.content.clone() }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionResponse {
    pub response: String,
}

impl CompletionResponse {
    /// Wraps provider content, substituting the fallback text when it is missing or blank.
    pub fn from_content(content: Option<String>) -> Self {
        let response = content
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_REPLY.to_string());
        Self { response }
    }
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[PromptMessage]
    ) -> Result<CompletionResponse, LlmError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> String;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, LlmError> {
    let client: Arc<dyn ChatClient> = match config.llm_type {
        LlmType::OpenRouter | LlmType::OpenAI => {
            let specific_client = OpenAIChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::Ollama => {
            let specific_client = OllamaClient::from_config(config)?;
            Arc::new(specific_client)
        }
    };
    Ok(client)
}
