//! Централизованная конфигурация для CrewChat Core
//!
//! Все константы и настройки должны быть определены здесь,
//! чтобы избежать хардкода по всему проекту.

use std::sync::OnceLock;

/// Глобальная конфигурация (синглтон)
static GLOBAL_CONFIG: OnceLock<Config> = OnceLock::new();

/// Основная структура конфигурации
#[derive(Debug, Clone)]
pub struct Config {
    // ============================================
    // КРИПТОГРАФИЧЕСКИЕ ПАРАМЕТРЫ
    // ============================================

    /// PBKDF2: количество итераций для деривации wrapping-ключа из пароля
    pub pbkdf2_iterations: u32,

    /// Длина соли для PBKDF2 (в байтах)
    pub salt_length: usize,

    /// Длина ключа для AES-256 (в байтах)
    pub key_length: usize,

    /// Длина nonce для AES-GCM (в байтах)
    pub nonce_length: usize,

    /// Размер GCM authentication tag (в байтах)
    pub gcm_tag_length: usize,

    /// Размер публичного ключа X25519 (в байтах)
    pub public_key_size: usize,

    // ============================================
    // ЧАТ
    // ============================================

    /// Сколько сообщений истории загружается при инициализации сессии
    pub history_limit: usize,

    // ============================================
    // ВАЛИДАЦИЯ
    // ============================================

    /// Минимальная длина пароля для нового identity-ключа
    pub password_min_length: usize,
}

impl Config {
    /// Создать конфигурацию с дефолтными значениями
    pub fn default() -> Self {
        Self {
            // Криптография
            pbkdf2_iterations: 100_000,
            salt_length: 16,
            key_length: 32,
            nonce_length: 12,
            gcm_tag_length: 16,
            public_key_size: 32,

            // Чат
            history_limit: 200,

            // Валидация
            password_min_length: 8,
        }
    }

    /// Создать конфигурацию из переменных окружения
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("PBKDF2_ITERATIONS") {
            if let Ok(parsed) = val.parse() {
                config.pbkdf2_iterations = parsed;
            }
        }

        if let Ok(val) = std::env::var("CHAT_HISTORY_LIMIT") {
            if let Ok(parsed) = val.parse() {
                config.history_limit = parsed;
            }
        }

        config
    }

    /// Получить глобальный экземпляр конфигурации
    ///
    /// Автоматически инициализирует конфигурацию со значениями
    /// по умолчанию при первом вызове
    pub fn global() -> &'static Config {
        GLOBAL_CONFIG.get_or_init(Config::default)
    }

    /// Инициализировать глобальную конфигурацию из переменных окружения
    ///
    /// # Errors
    ///
    /// Возвращает ошибку, если конфигурация уже была инициализирована
    pub fn init_from_env() -> Result<(), &'static str> {
        GLOBAL_CONFIG
            .set(Self::from_env())
            .map_err(|_| "Config already initialized")
    }

    /// Инициализировать глобальную конфигурацию с кастомным экземпляром
    ///
    /// # Errors
    ///
    /// Возвращает ошибку, если конфигурация уже была инициализирована
    pub fn init_with(config: Config) -> Result<(), &'static str> {
        GLOBAL_CONFIG.set(config).map_err(|_| "Config already initialized")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pbkdf2_iterations, 100_000);
        assert_eq!(config.history_limit, 200);
        assert_eq!(config.password_min_length, 8);
    }

    #[test]
    fn test_config_values() {
        let config = Config::default();

        // Crypto params
        assert_eq!(config.salt_length, 16);
        assert_eq!(config.key_length, 32);
        assert_eq!(config.nonce_length, 12);
        assert_eq!(config.gcm_tag_length, 16);
        assert_eq!(config.public_key_size, 32);
    }
}
