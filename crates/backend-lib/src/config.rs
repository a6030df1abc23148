// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management for the carelink server.
//!
//! Configuration is loaded from, in order of precedence:
//! 1. Default values
//! 2. An optional configuration file (`config/default.*`)
//! 3. `APP_`-prefixed environment variables
//!
//! Only the settings the room coordinator reads live here: server bind
//! address, database path, token signing secret and TTL, provider
//! credentials and timeouts, cache TTLs, the offline queue cap, and the
//! CORS origin handed to the outer HTTP surface.

use anyhow::Result;
use config::{Config, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub provider: ProviderSettings,
    pub cache: CacheSettings,
    pub queue: QueueSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// HMAC-SHA-256 secret used to verify bearer tokens.
    pub token_secret: String,
    /// Lifetime of issued tokens, in seconds.
    pub token_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: String,
    /// Model used for translation requests.
    pub chat_model: String,
    /// Model used for speech-to-text requests.
    pub stt_model: String,
    /// Model used for text-to-speech requests.
    pub tts_model: String,
    /// Deadline for translation calls.
    pub translate_timeout_secs: u64,
    /// Deadline for transcription and synthesis calls.
    pub speech_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheSettings {
    pub translation_ttl_secs: u64,
    pub tts_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueSettings {
    /// Maximum undelivered messages retained per room; oldest are dropped
    /// beyond this.
    pub per_room_cap: usize,
}

impl Settings {
    /// Load configuration from environment and file
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specified path
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origin: "http://localhost:5173".to_string(),
            },
            database: DatabaseSettings {
                path: PathBuf::from("data/carelink.db"),
            },
            auth: AuthSettings {
                token_secret: String::new(),
                token_ttl_secs: 24 * 60 * 60,
            },
            provider: ProviderSettings {
                base_url: "https://api.openai.com/v1".to_string(),
                api_key: String::new(),
                chat_model: "gpt-4o-mini".to_string(),
                stt_model: "whisper-1".to_string(),
                tts_model: "tts-1".to_string(),
                translate_timeout_secs: 15,
                speech_timeout_secs: 30,
            },
            cache: CacheSettings {
                translation_ttl_secs: 7 * 24 * 60 * 60,
                tts_ttl_secs: 24 * 60 * 60,
            },
            queue: QueueSettings { per_room_cap: 256 },
        }
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Settings::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.cache.translation_ttl_secs, 7 * 24 * 60 * 60);
        assert_eq!(config.cache.tts_ttl_secs, 24 * 60 * 60);
        assert_eq!(config.queue.per_room_cap, 256);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let config_content = r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [auth]
            token_secret = "test-secret"

            [queue]
            per_room_cap = 16
        "#;

        fs::write(&config_path, config_content).unwrap();

        let settings = Settings::load_from(config_path.to_str().unwrap()).unwrap();
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.auth.token_secret, "test-secret");
        assert_eq!(settings.queue.per_room_cap, 16);
        // untouched sections keep their defaults
        assert_eq!(settings.provider.stt_model, "whisper-1");
    }
}
