// CrewChat Core
// Движок сквозного шифрования личных сообщений для CrewPlan

#![warn(clippy::all)]

// Модули
pub mod config;
pub mod crypto;
pub mod error;
pub mod session;
pub mod storage;
pub mod utils;

// Re-exports для удобства
pub use config::Config;
pub use error::{ChatError, Result};
pub use session::{ChatMessage, ConversationSession, MessageBody, SessionState};
pub use storage::memory::MemoryStore;
pub use storage::ChatStore;
