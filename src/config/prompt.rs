use serde::Deserialize;
use std::fs;
use std::sync::Arc;
use log::info;
use thiserror::Error;
use crate::llm::chat::PromptMessage;
use crate::models::chat::ChatMessage;

pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are AegisAI.
Use real-time data if provided.
Be clear, structured, and professional.
Never mention knowledge cutoff.";

pub const DEFAULT_SEARCH_HEADER: &str = "REAL-TIME SEARCH DATA:";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt file IO error for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Prompt JSON parsing error for '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Prompt field '{0}' must not be empty")]
    EmptyField(&'static str),
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PromptConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_search_header")]
    pub search_context_header: String,
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_search_header() -> String {
    DEFAULT_SEARCH_HEADER.to_string()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            search_context_header: default_search_header(),
        }
    }
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        if self.system_prompt.trim().is_empty() {
            return Err(PromptError::EmptyField("system_prompt"));
        }
        if self.search_context_header.trim().is_empty() {
            return Err(PromptError::EmptyField("search_context_header"));
        }
        Ok(())
    }
}

pub fn load_prompts_from_str(json: &str, path: &str) -> Result<Arc<PromptConfig>, PromptError> {
    let config: PromptConfig = serde_json::from_str(json).map_err(|source| PromptError::Json {
        path: path.to_string(),
        source,
    })?;
    config.validate()?;
    Ok(Arc::new(config))
}

pub fn load_prompts(path: &str) -> Result<Arc<PromptConfig>, PromptError> {
    let file_content = fs::read_to_string(path).map_err(|source| PromptError::Io {
        path: path.to_string(),
        source,
    })?;
    load_prompts_from_str(&file_content, path)
}

/// Built-in prompts unless a prompts file is configured.
pub fn initialize_prompts(path: Option<&str>) -> Result<Arc<PromptConfig>, PromptError> {
    match path {
        Some(p) => {
            info!("Loading prompts from: {}", p);
            load_prompts(p)
        }
        None => {
            info!("Using built-in AegisAI prompts");
            Ok(Arc::new(PromptConfig::default()))
        }
    }
}

/// Persona instruction, then the optional search block, then the conversation window.
pub fn compose_prompt(
    config: &PromptConfig,
    window: &[ChatMessage],
    search_results: Option<&str>
) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(window.len() + 2);
    messages.push(PromptMessage::system(config.system_prompt.clone()));

    if let Some(results) = search_results {
        messages.push(
            PromptMessage::system(format!("{}\n{}", config.search_context_header, results))
        );
    }

    messages.extend(window.iter().map(PromptMessage::from));
    messages
}
