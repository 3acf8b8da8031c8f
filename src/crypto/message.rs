// Шифрование тел сообщений
// AES-256-GCM под ключом беседы, свежий nonce на каждое сообщение

use crate::crypto::session_key::SessionKey;
use crate::error::{ChatError, Result};
use crate::utils::b64;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;

const NONCE_LENGTH: usize = 12;

/// Шифротекст одного сообщения в транспортной форме
///
/// Оба поля — Base64-текст, готовый к записи в текстовые колонки.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherText {
    pub iv: String,
    pub ciphertext: String,
}

/// Зашифровать тело сообщения
///
/// Nonce генерируется заново на каждый вызов и никогда не
/// переиспользуется под одним ключом.
pub fn encrypt_message(key: &SessionKey, plaintext: &str) -> Result<CipherText> {
    let mut nonce_bytes = [0u8; NONCE_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = Aes256Gcm::new(key.expose().into());
    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| ChatError::Crypto(format!("Encryption failed: {}", e)))?;

    Ok(CipherText {
        iv: b64::encode(&nonce_bytes),
        ciphertext: b64::encode(&ciphertext),
    })
}

/// Расшифровать тело сообщения
///
/// Любая проблема (битый Base64, неверная длина nonce, не сошёлся
/// GCM-тег, не-UTF-8 plaintext) даёт `Decryption`: ошибка одного
/// сообщения восстановима и не должна ронять остальную историю.
pub fn decrypt_message(key: &SessionKey, iv: &str, ciphertext: &str) -> Result<String> {
    let nonce_bytes = b64::decode(iv)
        .map_err(|e| ChatError::Decryption(format!("Invalid iv encoding: {}", e)))?;
    let ciphertext_bytes = b64::decode(ciphertext)
        .map_err(|e| ChatError::Decryption(format!("Invalid ciphertext encoding: {}", e)))?;

    if nonce_bytes.len() != NONCE_LENGTH {
        return Err(ChatError::Decryption(format!(
            "Invalid nonce length: expected {}, got {}",
            NONCE_LENGTH,
            nonce_bytes.len()
        )));
    }
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = Aes256Gcm::new(key.expose().into());
    let plaintext = cipher
        .decrypt(nonce, ciphertext_bytes.as_ref())
        .map_err(|_| ChatError::Decryption("authentication tag mismatch".to_string()))?;

    String::from_utf8(plaintext)
        .map_err(|_| ChatError::Decryption("decrypted body is not valid UTF-8".to_string()))
}
