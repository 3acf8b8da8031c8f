// Identity-ключи пользователей
//
// Одна долговременная пара X25519 на пользователя. Используется только
// для key agreement (подписей в этой системе нет). Публичный ключ
// хранится открыто в виде JWK-подобной записи, приватный — только в
// зашифрованном контейнере (см. key_wrap).

use crate::error::{ChatError, Result};
use crate::utils::b64;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

/// Версия бинарного контейнера приватного ключа
const CONTAINER_VERSION: u8 = 1;

const JWK_KTY: &str = "OKP";
const JWK_CRV: &str = "X25519";

/// Пара identity-ключей X25519
#[derive(Clone)]
pub struct IdentityKeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl std::fmt::Debug for IdentityKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityKeyPair")
            .field("public", &self.public)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Портируемая JSON-запись публичного ключа (JWK-подобная)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyRecord {
    pub kty: String,
    pub crv: String,
    /// Base64 сырых байтов публичного ключа
    pub x: String,
}

/// Бинарный контейнер приватного ключа (сериализуется bincode)
#[derive(Serialize, Deserialize)]
struct PrivateKeyContainer {
    version: u8,
    key: Vec<u8>,
}

impl IdentityKeyPair {
    /// Сгенерировать новую пару ключей
    ///
    /// Чистая генерация: персистентность — ответственность вызывающего.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(rand::rngs::OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Восстановить пару из бинарного контейнера приватного ключа
    pub fn from_container(bytes: &[u8]) -> Result<Self> {
        let container: PrivateKeyContainer = bincode::deserialize(bytes)
            .map_err(|e| ChatError::KeyFormat(format!("Invalid private key container: {}", e)))?;

        if container.version != CONTAINER_VERSION {
            return Err(ChatError::KeyFormat(format!(
                "Unsupported private key container version: {}",
                container.version
            )));
        }

        let secret_bytes = to_array_32(&container.key)?;
        let secret = StaticSecret::from(secret_bytes);
        let public = PublicKey::from(&secret);
        Ok(Self { secret, public })
    }

    /// Экспортировать приватный ключ в бинарный контейнер
    ///
    /// Контейнер не зашифрован: перед сохранением его оборачивают
    /// паролем через [`crate::crypto::key_wrap::wrap_private_key`].
    pub fn export_container(&self) -> Result<Zeroizing<Vec<u8>>> {
        let container = PrivateKeyContainer {
            version: CONTAINER_VERSION,
            key: self.secret.to_bytes().to_vec(),
        };
        let bytes = bincode::serialize(&container)
            .map_err(|e| ChatError::KeyFormat(format!("Container serialization failed: {}", e)))?;
        Ok(Zeroizing::new(bytes))
    }

    /// Экспортировать публичный ключ в портируемую запись
    pub fn public_record(&self) -> PublicKeyRecord {
        PublicKeyRecord {
            kty: JWK_KTY.to_string(),
            crv: JWK_CRV.to_string(),
            x: b64::encode(self.public.as_bytes()),
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub(crate) fn secret_key(&self) -> &StaticSecret {
        &self.secret
    }
}

impl PublicKeyRecord {
    /// Импортировать публичный ключ из записи
    pub fn import(&self) -> Result<PublicKey> {
        if self.kty != JWK_KTY || self.crv != JWK_CRV {
            return Err(ChatError::KeyFormat(format!(
                "Unsupported key type: kty={}, crv={}",
                self.kty, self.crv
            )));
        }

        let raw = b64::decode(&self.x)
            .map_err(|e| ChatError::KeyFormat(format!("Invalid public key encoding: {}", e)))?;
        let bytes = to_array_32(&raw)?;
        Ok(PublicKey::from(bytes))
    }
}

/// Конвертировать срез в [u8; 32]
fn to_array_32(bytes: &[u8]) -> Result<[u8; 32]> {
    if bytes.len() != 32 {
        return Err(ChatError::KeyFormat(format!(
            "Invalid key length: expected 32, got {}",
            bytes.len()
        )));
    }

    let mut array = [0u8; 32];
    array.copy_from_slice(bytes);
    Ok(array)
}
