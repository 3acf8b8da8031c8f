// In-memory хранилище для тестов и встраивания без внешней БД

use crate::error::{ChatError, Result};
use crate::storage::models::{canonical_pair, Conversation, EncryptedMessage, StoredIdentity};
use crate::storage::ChatStore;
use crate::utils::time::current_timestamp;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    identities: HashMap<String, StoredIdentity>,
    conversations: HashMap<(String, String), Conversation>,
    messages: Vec<EncryptedMessage>,
}

/// In-memory реализация ChatStore
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| ChatError::Storage("store lock poisoned".to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn get_identity(&self, user_id: &str) -> Result<Option<StoredIdentity>> {
        Ok(self.lock()?.identities.get(user_id).cloned())
    }

    async fn put_identity(&self, identity: StoredIdentity) -> Result<()> {
        self.lock()?
            .identities
            .insert(identity.user_id.clone(), identity);
        Ok(())
    }

    async fn get_or_create_conversation(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> Result<Conversation> {
        let pair = canonical_pair(user_a, user_b);
        let mut inner = self.lock()?;

        if let Some(conversation) = inner.conversations.get(&pair) {
            return Ok(conversation.clone());
        }

        let conversation = Conversation {
            id: uuid::Uuid::new_v4().to_string(),
            user_a: pair.0.clone(),
            user_b: pair.1.clone(),
            created_at: current_timestamp(),
        };
        inner.conversations.insert(pair, conversation.clone());
        Ok(conversation)
    }

    async fn list_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<EncryptedMessage>> {
        let inner = self.lock()?;

        let mut messages: Vec<EncryptedMessage> = inner
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();

        // Стабильная сортировка: при равных timestamp сохраняется
        // порядок вставки
        messages.sort_by_key(|m| m.created_at);
        messages.truncate(limit);

        Ok(messages)
    }

    async fn append_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        iv: String,
        ciphertext: String,
    ) -> Result<EncryptedMessage> {
        let message = EncryptedMessage {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_string(),
            sender_id: sender_id.to_string(),
            iv,
            ciphertext,
            created_at: current_timestamp(),
        };

        self.lock()?.messages.push(message.clone());
        Ok(message)
    }
}
