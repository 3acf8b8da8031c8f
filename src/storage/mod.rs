// Граница хранилища
//
// Крипто-ядро не знает, где лежат записи: коллаборатор внедряется в
// ConversationSession одним экземпляром при старте приложения.

pub mod memory;
pub mod models;

use crate::error::Result;
use async_trait::async_trait;
use models::{Conversation, EncryptedMessage, StoredIdentity};

/// Контракт хранилища защищённого чата
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Найти identity пользователя
    async fn get_identity(&self, user_id: &str) -> Result<Option<StoredIdentity>>;

    /// Сохранить identity пользователя
    async fn put_identity(&self, identity: StoredIdentity) -> Result<()>;

    /// Найти или создать беседу пары (порядок аргументов не важен)
    async fn get_or_create_conversation(&self, user_a: &str, user_b: &str)
        -> Result<Conversation>;

    /// Сообщения беседы, старые первыми, не больше `limit`
    async fn list_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<EncryptedMessage>>;

    /// Добавить сообщение; id и timestamp назначает хранилище
    async fn append_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        iv: String,
        ciphertext: String,
    ) -> Result<EncryptedMessage>;
}
