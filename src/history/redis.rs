use async_trait::async_trait;
use crate::error::StoreError;
use crate::history::{ ConversationStore, CredentialStore };
use crate::models::chat::Conversation;
use crate::models::user::Credential;
use redis::{ Client, AsyncCommands };

/// Conversations are stored whole, as one JSON document per user.
pub struct RedisStore {
    client: Client,
    key_prefix: String,
}

impl RedisStore {
    pub fn new(url: &str, key_prefix: &str) -> Result<Self, StoreError> {
        Ok(Self {
            client: Client::open(url)?,
            key_prefix: key_prefix.to_string(),
        })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    fn conversation_key(&self, user_id: &str) -> String {
        format!("{}conversation:{}", self.key_prefix, user_id)
    }

    fn credential_key(&self, email: &str) -> String {
        format!("{}credential:{}", self.key_prefix, email)
    }
}

#[async_trait]
impl ConversationStore for RedisStore {
    async fn load(&self, user_id: &str) -> Result<Option<Conversation>, StoreError> {
        let mut conn = self.get_connection().await?;
        let json: Option<String> = conn.get(self.conversation_key(user_id)).await?;
        match json {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let mut conn = self.get_connection().await?;
        let json = serde_json::to_string(conversation)?;
        let _: () = conn.set(self.conversation_key(&conversation.user_id), json).await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for RedisStore {
    async fn find_credential(&self, email: &str) -> Result<Option<Credential>, StoreError> {
        let mut conn = self.get_connection().await?;
        let json: Option<String> = conn.get(self.credential_key(email)).await?;
        match json {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn insert_credential(&self, credential: &Credential) -> Result<bool, StoreError> {
        let mut conn = self.get_connection().await?;
        let json = serde_json::to_string(credential)?;
        let inserted: bool = conn.set_nx(self.credential_key(&credential.email), json).await?;
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced() {
        let store = RedisStore::new("redis://127.0.0.1:6379", "aegis:").unwrap();
        assert_eq!(store.conversation_key("u1"), "aegis:conversation:u1");
        assert_eq!(store.credential_key("a@b.com"), "aegis:credential:a@b.com");
    }
}
