//! Криптографический модуль
//!
//! # Архитектура
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │            ConversationSession (session.rs)         │
//! │  - оркестрация: ключи → общий секрет → история      │
//! └─────────────────────────────────────────────────────┘
//!                          │
//!          ┌───────────────┼────────────────┐
//!          ▼               ▼                ▼
//! ┌────────────────┐ ┌─────────────┐ ┌──────────────┐
//! │  identity +    │ │ session_key │ │   message    │
//! │  key_wrap      │ │  (ECDH +    │ │ (AES-256-GCM │
//! │ (X25519 пара,  │ │ HKDF-SHA256)│ │  на тело     │
//! │  PBKDF2-wrap)  │ │             │ │  сообщения)  │
//! └────────────────┘ └─────────────┘ └──────────────┘
//! ```
//!
//! ## Модули
//!
//! - [`identity`]: identity-ключи пользователей (X25519), экспорт/импорт
//! - [`key_wrap`]: шифрование приватного контейнера паролем
//! - [`session_key`]: деривация симметричного ключа беседы
//! - [`message`]: шифрование/расшифровка тел сообщений
//!
//! ## Известное ограничение
//!
//! Ключ беседы деривируется через HKDF-SHA256 с фиксированной нулевой
//! солью и пустым info: уникальность ключа обеспечивается только самим
//! ECDH-секретом пары. Это сознательно сохранённое поведение исходной
//! системы (снижает диверсификацию ключей, но не ломает корректность
//! key agreement). Менять его нельзя без миграции уже сохранённых
//! шифротекстов.

pub mod identity;
pub mod key_wrap;
pub mod message;
pub mod session_key;

pub use identity::{IdentityKeyPair, PublicKeyRecord};
pub use key_wrap::{unwrap_private_key, wrap_private_key, EncryptedPrivateKeyBlob};
pub use message::{decrypt_message, encrypt_message, CipherText};
pub use session_key::{derive_session_key, SessionKey};
