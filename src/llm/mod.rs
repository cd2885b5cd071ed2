pub mod chat;
use serde::{ Deserialize, Serialize };
use std::str::FromStr;
use std::fmt;
use std::time::Duration;
use crate::error::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmType {
    OpenRouter,
    OpenAI,
    Ollama,
}

impl fmt::Display for LlmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LlmType::OpenRouter => "openrouter",
            LlmType::OpenAI => "openai",
            LlmType::Ollama => "ollama",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for LlmType {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openrouter" => Ok(LlmType::OpenRouter),
            "openai" => Ok(LlmType::OpenAI),
            "ollama" => Ok(LlmType::Ollama),
            _ => Err(LlmError::InvalidType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub llm_type: LlmType,
    pub api_key: Option<String>,
    pub completion_model: String,
    pub base_url: Option<String>,
    /// Sent as `HTTP-Referer`; only OpenRouter reads it.
    pub referer: Option<String>,
    /// Sent as `X-Title`; only OpenRouter reads it.
    pub title: Option<String>,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            llm_type: LlmType::OpenRouter,
            api_key: None,
            completion_model: "openai/gpt-3.5-turbo".to_string(),
            base_url: None,
            referer: None,
            title: Some("AegisAI".to_string()),
            timeout: Duration::from_secs(60),
        }
    }
}
