use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use async_trait::async_trait;
use super::{ ChatClient, CompletionResponse, PromptMessage };
use crate::error::LlmError;
use crate::llm::LlmConfig;

#[derive(Debug)]
pub struct OllamaClient {
    http: HttpClient,
    base_url: String,
    completion_model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ChatResponseMessage>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OllamaClient {
    pub fn new(
        base_url: Option<String>,
        completion_model: String,
        timeout: std::time::Duration
    ) -> Result<Self, LlmError> {
        let url = base_url.unwrap_or_else(|| "http://localhost:11434".into());
        let http = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: url,
            completion_model,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Self::new(config.base_url.clone(), config.completion_model.clone(), config.timeout)
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn complete(
        &self,
        messages: &[PromptMessage]
    ) -> Result<CompletionResponse, LlmError> {
        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let req = ChatRequest {
            model: &self.completion_model,
            messages,
            stream: false,
        };
        let data = self.http
            .post(&url)
            .json(&req)
            .send().await?
            .error_for_status()?
            .json::<ChatResponse>().await?;

        Ok(CompletionResponse::from_content(data.message.and_then(|m| m.content)))
    }

    fn get_model(&self) -> String {
        self.completion_model.clone()
    }

    fn get_base_url(&self) -> String {
        self.base_url.clone()
    }
}
