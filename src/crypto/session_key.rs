// Деривация симметричного ключа беседы
// X25519 Diffie-Hellman + HKDF-SHA256

use crate::error::{ChatError, Result};
use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

/// Фиксированная соль HKDF (см. известное ограничение в crypto/mod.rs)
const HKDF_SALT: [u8; 32] = [0u8; 32];

/// Симметричный ключ одной беседы
///
/// Живёт только в памяти активной сессии: никогда не сохраняется и не
/// экспортируется наружу (байты доступны только внутри крейта),
/// передеривируется при каждой инициализации.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct SessionKey([u8; 32]);

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey(<redacted>)")
    }
}

impl SessionKey {
    pub(crate) fn expose(&self) -> &[u8; 32] {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Деривировать ключ беседы из своего приватного и чужого публичного ключа
///
/// Свойство симметрии: derive(A.priv, B.pub) == derive(B.priv, A.pub) —
/// обе стороны приходят к одному ключу без дополнительного обмена.
pub fn derive_session_key(
    my_secret: &StaticSecret,
    peer_public: &PublicKey,
) -> Result<SessionKey> {
    let shared_secret = my_secret.diffie_hellman(peer_public);

    // Нулевой общий секрет означает ключ малого порядка у собеседника
    if !shared_secret.was_contributory() {
        return Err(ChatError::KeyAgreement(
            "peer public key is not a valid agreement key".to_string(),
        ));
    }

    let hk = Hkdf::<Sha256>::new(Some(&HKDF_SALT), shared_secret.as_bytes());
    let mut session_key = [0u8; 32];
    hk.expand(&[], &mut session_key)
        .map_err(|_| ChatError::KeyAgreement("HKDF expansion failed".to_string()))?;

    Ok(SessionKey(session_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::identity::IdentityKeyPair;

    #[test]
    fn test_derivation_is_symmetric() {
        let alice = IdentityKeyPair::generate();
        let bob = IdentityKeyPair::generate();

        let key_a = derive_session_key(alice.secret_key(), bob.public_key()).unwrap();
        let key_b = derive_session_key(bob.secret_key(), alice.public_key()).unwrap();

        assert_eq!(key_a.expose(), key_b.expose());
    }

    #[test]
    fn test_different_pairs_get_different_keys() {
        let alice = IdentityKeyPair::generate();
        let bob = IdentityKeyPair::generate();
        let carol = IdentityKeyPair::generate();

        let key_ab = derive_session_key(alice.secret_key(), bob.public_key()).unwrap();
        let key_ac = derive_session_key(alice.secret_key(), carol.public_key()).unwrap();

        assert_ne!(key_ab.expose(), key_ac.expose());
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let alice = IdentityKeyPair::generate();
        let bob = IdentityKeyPair::generate();

        let key1 = derive_session_key(alice.secret_key(), bob.public_key()).unwrap();
        let key2 = derive_session_key(alice.secret_key(), bob.public_key()).unwrap();

        assert_eq!(key1.expose(), key2.expose());
    }

    #[test]
    fn test_rejects_low_order_peer_key() {
        let alice = IdentityKeyPair::generate();
        // Нейтральный элемент группы — классический ключ малого порядка
        let low_order = PublicKey::from([0u8; 32]);

        let err = derive_session_key(alice.secret_key(), &low_order).unwrap_err();
        assert!(matches!(err, ChatError::KeyAgreement(_)));
    }
}
