// Шифрование приватного контейнера паролем пользователя
// PBKDF2 для деривации wrapping-ключа + AES-256-GCM для шифрования

use crate::config::Config;
use crate::error::{ChatError, Result};
use crate::utils::b64;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

// Compile-time константы для размеров массивов (должны совпадать с Config::default())
const SALT_LENGTH: usize = 16;
const KEY_LENGTH: usize = 32;
const NONCE_LENGTH: usize = 12;

/// Зашифрованный паролем контейнер приватного ключа
///
/// Все поля — Base64-текст: blob целиком хранится в обычных текстовых
/// колонках. Соль и nonce генерируются заново при каждом wrap и никогда
/// не переиспользуются между blob'ами.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPrivateKeyBlob {
    /// Соль PBKDF2
    pub salt: String,
    /// Nonce AES-GCM
    pub iv: String,
    /// Контейнер ключа + тег аутентификации
    pub ciphertext: String,
}

/// Деривировать wrapping-ключ из пароля с использованием PBKDF2-HMAC-SHA256
fn derive_wrapping_key(password: &str, salt: &[u8]) -> Zeroizing<[u8; KEY_LENGTH]> {
    let mut key = Zeroizing::new([0u8; KEY_LENGTH]);

    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        salt,
        Config::global().pbkdf2_iterations,
        &mut *key,
    );

    key
}

/// Зашифровать контейнер приватного ключа паролем
///
/// Каждый вызов даёт свежие соль и nonce, поэтому два wrap'а одного и
/// того же контейнера дают разные blob'ы.
pub fn wrap_private_key(container: &[u8], password: &str) -> Result<EncryptedPrivateKeyBlob> {
    let mut salt = [0u8; SALT_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut salt);

    let mut nonce_bytes = [0u8; NONCE_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let wrapping_key = derive_wrapping_key(password, &salt);
    let cipher = Aes256Gcm::new((&*wrapping_key).into());

    let ciphertext = cipher
        .encrypt(nonce, container)
        .map_err(|e| ChatError::Authentication(format!("Key wrap failed: {}", e)))?;

    Ok(EncryptedPrivateKeyBlob {
        salt: b64::encode(&salt),
        iv: b64::encode(&nonce_bytes),
        ciphertext: b64::encode(&ciphertext),
    })
}

/// Расшифровать контейнер приватного ключа паролем
///
/// Неверный пароль или повреждённый blob дают `Authentication`:
/// GCM-тег отвергает любую подмену, мусор наружу не возвращается.
pub fn unwrap_private_key(
    blob: &EncryptedPrivateKeyBlob,
    password: &str,
) -> Result<Zeroizing<Vec<u8>>> {
    let salt = b64::decode(&blob.salt)?;
    let nonce_bytes = b64::decode(&blob.iv)?;
    let ciphertext = b64::decode(&blob.ciphertext)?;

    if salt.len() != SALT_LENGTH {
        return Err(ChatError::KeyFormat(format!(
            "Invalid salt length: expected {}, got {}",
            SALT_LENGTH,
            salt.len()
        )));
    }
    if nonce_bytes.len() != NONCE_LENGTH {
        return Err(ChatError::KeyFormat(format!(
            "Invalid nonce length: expected {}, got {}",
            NONCE_LENGTH,
            nonce_bytes.len()
        )));
    }

    let wrapping_key = derive_wrapping_key(password, &salt);
    let cipher = Aes256Gcm::new((&*wrapping_key).into());
    let nonce = Nonce::from_slice(&nonce_bytes);

    let container = cipher
        .decrypt(nonce, ciphertext.as_ref())
        .map_err(|_| ChatError::Authentication("wrong password or corrupted key blob".to_string()))?;

    Ok(Zeroizing::new(container))
}

/// Валидация силы пароля
///
/// Применяется только при создании нового identity-ключа; разблокировка
/// существующего принимает любой пароль (проверку делает GCM-тег).
pub fn validate_password(password: &str) -> Result<()> {
    let min_length = Config::global().password_min_length;
    if password.len() < min_length {
        return Err(ChatError::Validation(format!(
            "Password must be at least {} characters long",
            min_length
        )));
    }

    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_numeric());

    if !has_letter || !has_digit {
        return Err(ChatError::Validation(
            "Password must contain both letters and numbers".to_string(),
        ));
    }

    Ok(())
}
