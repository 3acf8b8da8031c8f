// Типы ошибок

use thiserror::Error;

/// Ошибки защищённого чата
///
/// Разделение важно для вызывающего кода: `Decryption` восстановима на
/// уровне одного сообщения, остальные варианты фатальны для
/// инициализации сессии.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Невалидный Base64 во входных данных
    #[error("Invalid encoded data: {0}")]
    Format(String),

    /// Повреждённый или несовместимый ключевой материал
    #[error("Invalid key material: {0}")]
    KeyFormat(String),

    /// Неверный пароль или повреждённый blob приватного ключа
    #[error("Cannot unlock secure identity: {0}")]
    Authentication(String),

    /// Ключ не пригоден для выработки общего секрета
    #[error("Key agreement failed: {0}")]
    KeyAgreement(String),

    /// У собеседника ещё нет identity-ключа
    #[error("Peer '{0}' has not set up secure chat yet")]
    PeerKeyless(String),

    /// Ошибка расшифровки одного сообщения (не фатальна для сессии)
    #[error("Message decryption failed: {0}")]
    Decryption(String),

    /// Прочая ошибка криптопримитива
    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, ChatError>;
