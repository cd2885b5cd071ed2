mod memory;
mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use crate::cli::Args;
use crate::error::StoreError;
use crate::models::chat::Conversation;
use crate::models::user::Credential;

#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn load(&self, user_id: &str) -> Result<Option<Conversation>, StoreError>;

    /// Overwrites the stored log for `conversation.user_id`.
    async fn save(&self, conversation: &Conversation) -> Result<(), StoreError>;
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_credential(&self, email: &str) -> Result<Option<Credential>, StoreError>;

    /// Returns `false` without writing if the email is already registered.
    async fn insert_credential(&self, credential: &Credential) -> Result<bool, StoreError>;
}

/// A single backend serves both conversations and credentials.
pub trait Store: ConversationStore + CredentialStore {}

impl<T: ConversationStore + CredentialStore> Store for T {}

pub fn create_store(args: &Args) -> Result<Arc<dyn Store>, StoreError> {
    match args.history_type.to_lowercase().as_str() {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        "redis" => {
            let store = RedisStore::new(&args.history_host, &args.history_redis_prefix)?;
            Ok(Arc::new(store))
        }
        other => Err(StoreError::UnsupportedType(other.to_string())),
    }
}

pub fn initialize_store(args: &Args) -> Result<Arc<dyn Store>, StoreError> {
    if args.history_type.eq_ignore_ascii_case("memory") {
        info!("Chat history will be kept in memory");
    } else {
        info!("Chat history will be stored in: {} at {}", args.history_type, args.history_host);
    }
    create_store(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn rejects_unknown_backend() {
        let args = Args::parse_from(["aegis-relay", "--history-type", "mongo"]);
        assert!(matches!(create_store(&args), Err(StoreError::UnsupportedType(t)) if t == "mongo"));
    }

    #[test]
    fn redis_backend_opens_lazily() {
        let args = Args::parse_from(["aegis-relay", "--history-type", "redis"]);
        assert!(create_store(&args).is_ok());
    }
}
