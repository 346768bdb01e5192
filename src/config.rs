//! Configuration management for Folio Server

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::document::CacheConfig;
use crate::formats::ParserOptions;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub cache: CacheSettings,
    pub text: TextConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root of the per-fingerprint extraction directories
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Idle time after which a document is evicted
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone)]
pub struct TextConfig {
    /// Window size for plain text without chapter headings
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            storage: StorageConfig {
                data_dir: PathBuf::from("data"),
            },
            cache: CacheSettings {
                ttl_secs: 24 * 60 * 60,
                sweep_interval_secs: 10 * 60,
            },
            text: TextConfig {
                chunk_size: crate::formats::txt::DEFAULT_CHUNK_SIZE,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port),
            },
            storage: StorageConfig {
                data_dir: env::var("DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.data_dir),
            },
            cache: CacheSettings {
                ttl_secs: parse_var("CACHE_TTL_SECS", defaults.cache.ttl_secs),
                sweep_interval_secs: parse_var(
                    "CACHE_SWEEP_INTERVAL_SECS",
                    defaults.cache.sweep_interval_secs,
                ),
            },
            text: TextConfig {
                chunk_size: parse_var("TXT_CHUNK_SIZE", defaults.text.chunk_size),
            },
        }
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl: Duration::from_secs(self.cache.ttl_secs),
            sweep_interval: Duration::from_secs(self.cache.sweep_interval_secs.max(1)),
        }
    }

    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            txt_chunk_size: self.text.chunk_size.max(1),
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            tracing::warn!("Invalid {}={:?} ({}), using default {}", name, raw, e, default);
            default
        }),
        Err(_) => default,
    }
}
