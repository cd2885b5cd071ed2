mod serper;

pub use self::serper::SerperClient;

use async_trait::async_trait;
use log::{ info, warn };
use serde::{ Deserialize, Serialize };
use std::sync::Arc;
use std::time::Duration;
use crate::cli::Args;
use crate::error::SearchError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub link: String,
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Organic results for `query`, best match first.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError>;
}

/// Builds the search client, or `None` when search is disabled or has no key.
pub fn initialize_search_client(
    args: &Args
) -> Result<Option<Arc<dyn SearchClient>>, SearchError> {
    if !args.enable_search {
        info!("Search augmentation disabled.");
        return Ok(None);
    }
    if !args.search_enabled() {
        warn!("Search augmentation enabled but SEARCH_API_KEY is empty. Continuing without search.");
        return Ok(None);
    }
    let client = SerperClient::new(
        args.search_api_key.clone(),
        args.search_base_url.clone(),
        Duration::from_secs(args.http_timeout_secs)
    )?;
    info!("Search augmentation via {}", args.search_base_url);
    Ok(Some(Arc::new(client)))
}

/// Formats the top `limit` hits as the text block injected into the prompt.
/// Returns `None` when there is nothing to inject.
pub fn format_search_results(hits: &[SearchHit], limit: usize) -> Option<String> {
    let blocks = hits
        .iter()
        .take(limit)
        .map(|hit| format!("Title: {}\nSnippet: {}\nSource: {}", hit.title, hit.snippet, hit.link))
        .collect::<Vec<_>>();

    if blocks.is_empty() {
        None
    } else {
        Some(blocks.join("\n\n"))
    }
}
