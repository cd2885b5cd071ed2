use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use crate::error::StoreError;
use crate::history::{ ConversationStore, CredentialStore };
use crate::models::chat::Conversation;
use crate::models::user::Credential;

/// In-process store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    conversations: RwLock<HashMap<String, Conversation>>,
    credentials: RwLock<HashMap<String, Credential>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn load(&self, user_id: &str) -> Result<Option<Conversation>, StoreError> {
        Ok(self.conversations.read().await.get(user_id).cloned())
    }

    async fn save(&self, conversation: &Conversation) -> Result<(), StoreError> {
        self.conversations
            .write().await
            .insert(conversation.user_id.clone(), conversation.clone());
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_credential(&self, email: &str) -> Result<Option<Credential>, StoreError> {
        Ok(self.credentials.read().await.get(email).cloned())
    }

    async fn insert_credential(&self, credential: &Credential) -> Result<bool, StoreError> {
        let mut guard = self.credentials.write().await;
        if guard.contains_key(&credential.email) {
            return Ok(false);
        }
        guard.insert(credential.email.clone(), credential.clone());
        Ok(true)
    }
}
