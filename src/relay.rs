use crate::cli::Args;
use crate::config::prompt::{ compose_prompt, PromptConfig };
use crate::error::RelayError;
use crate::history::{ ConversationStore, Store };
use crate::llm::chat::ChatClient;
use crate::models::chat::{ Conversation, Role };
use crate::search::{ format_search_results, SearchClient };

use log::{ debug, info, warn, error };
use std::collections::HashMap;
use std::sync::{ Arc, Mutex };
use tokio::sync::Mutex as AsyncMutex;

pub const DEFAULT_CONTEXT_WINDOW: usize = 10;
pub const DEFAULT_SEARCH_RESULTS: usize = 3;

/// Loads a user's log, asks the model for the next turn and persists both turns.
pub struct ChatRelay {
    store: Arc<dyn Store>,
    chat_client: Arc<dyn ChatClient>,
    search_client: Option<Arc<dyn SearchClient>>,
    prompts: Arc<PromptConfig>,
    context_window: usize,
    search_result_limit: usize,
    user_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ChatRelay {
    pub fn new(
        store: Arc<dyn Store>,
        chat_client: Arc<dyn ChatClient>,
        prompts: Arc<PromptConfig>
    ) -> Self {
        Self {
            store,
            chat_client,
            search_client: None,
            prompts,
            context_window: DEFAULT_CONTEXT_WINDOW,
            search_result_limit: DEFAULT_SEARCH_RESULTS,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_search(mut self, client: Option<Arc<dyn SearchClient>>) -> Self {
        self.search_client = client;
        self
    }

    /// Clamped to at least one so the newest user message is always sent.
    pub fn with_context_window(mut self, size: usize) -> Self {
        self.context_window = size.max(1);
        self
    }

    pub fn with_search_result_limit(mut self, limit: usize) -> Self {
        self.search_result_limit = limit;
        self
    }

    pub fn from_args(
        args: &Args,
        store: Arc<dyn Store>,
        chat_client: Arc<dyn ChatClient>,
        search_client: Option<Arc<dyn SearchClient>>,
        prompts: Arc<PromptConfig>
    ) -> Self {
        Self::new(store, chat_client, prompts)
            .with_search(search_client)
            .with_context_window(args.context_window)
            .with_search_result_limit(args.search_result_limit)
    }

    fn user_lock(&self, user_id: &str) -> UserLock<'_> {
        let mut locks = self.user_locks.lock().unwrap_or_else(|e| e.into_inner());
        let lock = Arc::clone(locks.entry(user_id.to_string()).or_default());
        UserLock {
            locks: &self.user_locks,
            user_id: user_id.to_string(),
            lock,
        }
    }

    async fn search_context(&self, message: &str) -> Option<String> {
        let client = self.search_client.as_ref()?;
        match client.search(message).await {
            Ok(hits) => {
                debug!("Search returned {} results", hits.len());
                format_search_results(&hits, self.search_result_limit)
            }
            Err(e) => {
                warn!("Search augmentation skipped: {}", e);
                None
            }
        }
    }

    async fn run_turn(&self, user_id: &str, message: &str) -> Result<String, RelayError> {
        let mut conversation = self.store
            .load(user_id).await?
            .unwrap_or_else(|| {
                info!("Starting new conversation for {}", user_id);
                Conversation::new(user_id)
            });

        conversation.push(Role::User, message);

        let search_results = self.search_context(message).await;
        let prompt = compose_prompt(
            &self.prompts,
            conversation.window(self.context_window),
            search_results.as_deref()
        );

        let reply = self.chat_client
            .complete(&prompt).await
            .map_err(|e| {
                error!("AI ERROR for {}: {}", user_id, e);
                e
            })?
            .response;

        conversation.push(Role::Assistant, reply.clone());
        self.store.save(&conversation).await?;

        Ok(reply)
    }

    pub async fn process_message(
        &self,
        user_id: &str,
        message: &str
    ) -> Result<String, RelayError> {
        if user_id.trim().is_empty() || message.trim().is_empty() {
            return Err(RelayError::Validation);
        }
        info!("Chat request from {}", user_id);

        let entry = self.user_lock(user_id);
        let _guard = entry.lock.lock().await;
        self.run_turn(user_id, message).await
    }
}

/// Per-user lock entry that drops itself from the registry on drop, including
/// when the request future is cancelled mid-turn.
struct UserLock<'a> {
    locks: &'a Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    user_id: String,
    lock: Arc<AsyncMutex<()>>,
}

impl Drop for UserLock<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // Only the map and this entry hold it: nobody is waiting.
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.user_id);
        }
    }
}
