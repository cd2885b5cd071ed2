use async_trait::async_trait;
use log::debug;
use reqwest::{Client as HttpClient, header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION}};
use serde::{Deserialize, Serialize};

use super::{ChatClient, CompletionResponse, PromptMessage};
use crate::error::LlmError;
use crate::llm::{LlmConfig, LlmType};

const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for any `/chat/completions` endpoint speaking the OpenAI wire format.
/// Used for both OpenRouter and OpenAI.
pub struct OpenAIChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIMessage>,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

impl OpenAIChatClient {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        extra_headers: HeaderMap,
        timeout: std::time::Duration,
    ) -> Result<Self, LlmError> {
        let mut headers = extra_headers;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", api_key))?);

        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            model,
            base_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let provider = match config.llm_type {
            LlmType::OpenAI => "OpenAI",
            _ => "OpenRouter",
        };
        let api_key = config.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LlmError::MissingApiKey(provider))?;

        let default_base = match config.llm_type {
            LlmType::OpenAI => OPENAI_BASE_URL,
            _ => OPENROUTER_BASE_URL,
        };
        let base_url = config.base_url.clone().unwrap_or_else(|| default_base.to_string());

        let mut extra_headers = HeaderMap::new();
        if config.llm_type == LlmType::OpenRouter {
            if let Some(referer) = &config.referer {
                extra_headers.insert("http-referer", HeaderValue::from_str(referer)?);
            }
            if let Some(title) = &config.title {
                extra_headers.insert("x-title", HeaderValue::from_str(title)?);
            }
        }

        Self::new(
            api_key,
            config.completion_model.clone(),
            base_url,
            extra_headers,
            config.timeout,
        )
    }

    fn completions_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{}/chat/completions", base)
        }
    }
}

fn first_choice_content(resp: OpenAIResponse) -> Option<String> {
    resp.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete(
        &self,
        messages: &[PromptMessage]
    ) -> Result<CompletionResponse, LlmError> {
        let url = self.completions_url();
        debug!("Sending {} messages to {} (model {})", messages.len(), url, self.model);

        let req = OpenAIChatRequest {
            model: &self.model,
            messages,
        };

        let resp = self.http.post(&url)
            .json(&req)
            .send()
            .await?
            .error_for_status()?
            .json::<OpenAIResponse>()
            .await?;

        Ok(CompletionResponse::from_content(first_choice_content(resp)))
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> String {
        self.base_url.clone()
    }
}
