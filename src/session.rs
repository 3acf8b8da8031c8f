//! Conversation Session — оркестратор защищённой беседы
//!
//! Объединяет identity-ключи, деривацию ключа беседы и шифрование
//! сообщений в один API для слоя UI.
//!
//! ## Типичный сценарий
//!
//! ```text
//! 1. Приложение создаёт сессию: ConversationSession::new(store, "alice", "bob")
//! 2. alice вводит пароль ключа → session.init(password)
//!    - загружается (или создаётся) её identity
//!    - загружается публичный ключ bob (нет ключа → PeerKeyless)
//!    - деривируется ключ беседы
//!    - подтягивается история, каждая строка расшифровывается
//! 3. session.send_message("…") / session.messages()
//! ```
//!
//! ## Контракт конкурентности
//!
//! `init()` идемпотентен по эффекту (повторный вызов передеривирует всё
//! с нуля и допустим после Failed) и не может запускаться параллельно
//! на одной сессии: `&mut self` сериализует вызовы на уровне типов.
//! Брошенный на полпути future (teardown вызывающего компонента) не
//! оставляет следов — следующий `init()` начинает с чистого состояния.
//!
//! ## Не отвечает за
//!
//! - хранение записей (это делает ChatStore)
//! - криптографические примитивы (модуль crypto)
//! - доставку сообщений собеседнику

use crate::config::Config;
use crate::crypto::identity::IdentityKeyPair;
use crate::crypto::key_wrap::{unwrap_private_key, validate_password, wrap_private_key};
use crate::crypto::message::{decrypt_message, encrypt_message};
use crate::crypto::session_key::{derive_session_key, SessionKey};
use crate::error::{ChatError, Result};
use crate::storage::models::{Conversation, EncryptedMessage, StoredIdentity};
use crate::storage::ChatStore;
use crate::utils::time::current_timestamp;
use std::sync::Arc;
use tracing::{info, warn};

/// Состояние сессии
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
    Failed,
}

/// Тело сообщения после расшифровки
///
/// `DecryptionFailed` — маркер для UI («не удалось расшифровать»):
/// одно битое сообщение не должно ронять рендер всей истории.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Plaintext(String),
    DecryptionFailed,
}

/// Сообщение в локальном представлении беседы
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub body: MessageBody,
    pub created_at: i64,
}

/// Защищённая беседа пары (текущий пользователь, собеседник)
///
/// Хранилище внедряется одним экземпляром (`Arc`) при создании; ключ
/// беседы живёт только внутри сессии и передеривируется каждым `init()`.
pub struct ConversationSession<S: ChatStore> {
    store: Arc<S>,
    user_id: String,
    peer_id: String,
    state: SessionState,
    last_error: Option<String>,
    session_key: Option<SessionKey>,
    conversation: Option<Conversation>,
    messages: Vec<ChatMessage>,
}

impl<S: ChatStore> ConversationSession<S> {
    pub fn new(store: Arc<S>, user_id: impl Into<String>, peer_id: impl Into<String>) -> Self {
        Self {
            store,
            user_id: user_id.into(),
            peer_id: peer_id.into(),
            state: SessionState::Uninitialized,
            last_error: None,
            session_key: None,
            conversation: None,
            messages: Vec::new(),
        }
    }

    /// Инициализировать сессию
    ///
    /// Пароль используется только внутри вызова: им разблокируется (или
    /// при первом входе — шифруется) приватный ключ пользователя. Любая
    /// ошибка шага переводит сессию в Failed и возвращается вызывающему;
    /// повторный `init()` допустим.
    pub async fn init(&mut self, password: &str) -> Result<()> {
        match self.init_inner(password).await {
            Ok(()) => {
                self.state = SessionState::Ready;
                self.last_error = None;
                info!(
                    target: "chat::session",
                    user_id = %self.user_id,
                    peer_id = %self.peer_id,
                    history = self.messages.len(),
                    "Secure session ready"
                );
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Failed;
                self.last_error = Some(e.to_string());
                self.session_key = None;
                self.conversation = None;
                self.messages.clear();
                warn!(
                    target: "chat::session",
                    user_id = %self.user_id,
                    peer_id = %self.peer_id,
                    error = %e,
                    "Secure session initialization failed"
                );
                Err(e)
            }
        }
    }

    async fn init_inner(&mut self, password: &str) -> Result<()> {
        // Повторная инициализация всегда начинается с чистого состояния
        self.session_key = None;
        self.conversation = None;
        self.messages.clear();

        // 1. Identity текущего пользователя: загрузить или создать
        let local = self.ensure_local_identity(password).await?;

        // 2. Публичный ключ собеседника; за него ключ не создаём
        let peer_identity = self
            .store
            .get_identity(&self.peer_id)
            .await?
            .ok_or_else(|| ChatError::PeerKeyless(self.peer_id.clone()))?;
        let peer_public = peer_identity.public_key.import()?;

        // 3. Ключ беседы
        let session_key = derive_session_key(local.secret_key(), &peer_public)?;

        info!(
            target: "chat::session",
            user_id = %self.user_id,
            peer_id = %self.peer_id,
            "Session key derived"
        );

        // 4. Запись беседы по канонической паре
        let conversation = self
            .store
            .get_or_create_conversation(&self.user_id, &self.peer_id)
            .await?;

        // 5. История, старые первыми
        let rows = self
            .store
            .list_messages(&conversation.id, Config::global().history_limit)
            .await?;

        self.session_key = Some(session_key);
        self.conversation = Some(conversation);

        let decrypted: Vec<ChatMessage> = rows.iter().map(|row| self.decrypt_row(row)).collect();
        self.messages = decrypted;

        Ok(())
    }

    /// Загрузить и разблокировать identity, либо создать новую
    async fn ensure_local_identity(&self, password: &str) -> Result<IdentityKeyPair> {
        if let Some(stored) = self.store.get_identity(&self.user_id).await? {
            let container = unwrap_private_key(&stored.encrypted_private, password)?;
            return IdentityKeyPair::from_container(&container);
        }

        // Первый вход в защищённый чат: слабый пароль отклоняем сразу
        validate_password(password)?;

        let pair = IdentityKeyPair::generate();
        let container = pair.export_container()?;
        let blob = wrap_private_key(&container, password)?;

        self.store
            .put_identity(StoredIdentity {
                user_id: self.user_id.clone(),
                public_key: pair.public_record(),
                encrypted_private: blob,
                created_at: current_timestamp(),
            })
            .await?;

        info!(
            target: "chat::session",
            user_id = %self.user_id,
            "Generated new secure chat identity"
        );

        Ok(pair)
    }

    /// Отправить сообщение
    ///
    /// No-op (`Ok(None)`) на пустом тексте и вне состояния Ready.
    pub async fn send_message(&mut self, text: &str) -> Result<Option<ChatMessage>> {
        if text.is_empty() || self.state != SessionState::Ready {
            return Ok(None);
        }

        let Some(key) = self.session_key.as_ref() else {
            return Ok(None);
        };
        let Some(conversation) = self.conversation.as_ref() else {
            return Ok(None);
        };

        let encrypted = encrypt_message(key, text)?;
        let row = self
            .store
            .append_message(&conversation.id, &self.user_id, encrypted.iv, encrypted.ciphertext)
            .await?;

        let message = ChatMessage {
            id: row.id,
            sender_id: row.sender_id,
            body: MessageBody::Plaintext(text.to_string()),
            created_at: row.created_at,
        };
        self.messages.push(message.clone());

        Ok(Some(message))
    }

    /// Расшифровать одну строку хранилища
    ///
    /// Никогда не возвращает ошибку: битая строка помечается маркером,
    /// остальная история остаётся читаемой.
    pub fn decrypt_row(&self, row: &EncryptedMessage) -> ChatMessage {
        let body = match self.session_key.as_ref() {
            Some(key) => match decrypt_message(key, &row.iv, &row.ciphertext) {
                Ok(plaintext) => MessageBody::Plaintext(plaintext),
                Err(e) => {
                    warn!(
                        target: "chat::session",
                        message_id = %row.id,
                        error = %e,
                        "Failed to decrypt message row"
                    );
                    MessageBody::DecryptionFailed
                }
            },
            None => MessageBody::DecryptionFailed,
        };

        ChatMessage {
            id: row.id.clone(),
            sender_id: row.sender_id.clone(),
            body,
            created_at: row.created_at,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Текст ошибки последней неудачной инициализации
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Локальное представление беседы (старые сообщения первыми)
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }
}
