// Base64 утилиты
//
// Единственная транспортная кодировка бинарных данных в crewchat:
// соли, nonce и шифротексты хранятся как обычные текстовые поля.

use crate::error::{ChatError, Result};
use base64::{engine::general_purpose, Engine};

pub fn encode(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(data)
}

pub fn decode(data: &str) -> Result<Vec<u8>> {
    general_purpose::STANDARD
        .decode(data)
        .map_err(|e| ChatError::Format(format!("Base64 decode failed: {}", e)))
}
