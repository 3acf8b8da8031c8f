// Модели данных для хранилища

use crate::crypto::identity::PublicKeyRecord;
use crate::crypto::key_wrap::EncryptedPrivateKeyBlob;
use serde::{Deserialize, Serialize};

/// Identity пользователя в хранилище
///
/// Публичный ключ лежит открыто, приватный — только в зашифрованном
/// паролем blob'е. Запись создаётся один раз при первом входе
/// пользователя в защищённый чат.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredIdentity {
    pub user_id: String,
    pub public_key: PublicKeyRecord,
    pub encrypted_private: EncryptedPrivateKeyBlob,
    pub created_at: i64,
}

/// Беседа двух пользователей
///
/// Участники всегда в каноническом (отсортированном) порядке, чтобы обе
/// стороны находили одну и ту же запись независимо от того, кто написал
/// первым.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub user_a: String,
    pub user_b: String,
    pub created_at: i64,
}

/// Зашифрованное сообщение в хранилище
///
/// iv и ciphertext — Base64-текст; метаданные (отправитель, беседа,
/// время) хранятся открыто и этой схемой не защищаются. Записи
/// иммутабельны: сообщение никогда не перезаписывается.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedMessage {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub iv: String,
    pub ciphertext: String,
    pub created_at: i64,
}

/// Канонический порядок пары пользователей (лексикографический)
pub fn canonical_pair(user_a: &str, user_b: &str) -> (String, String) {
    if user_a <= user_b {
        (user_a.to_string(), user_b.to_string())
    } else {
        (user_b.to_string(), user_a.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_pair_is_order_independent() {
        assert_eq!(canonical_pair("bob", "alice"), canonical_pair("alice", "bob"));
        assert_eq!(canonical_pair("alice", "bob"), ("alice".to_string(), "bob".to_string()));
    }

    #[test]
    fn test_canonical_pair_same_user() {
        assert_eq!(canonical_pair("alice", "alice"), ("alice".to_string(), "alice".to_string()));
    }
}
