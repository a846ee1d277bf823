/// Configuration loading for the scanner service

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub coingecko: CoinGeckoConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinGeckoConfig {
    pub base_url: String,
    /// Demo-tier API key, sent as the x-cg-demo-api-key header when set
    pub api_key: Option<String>,
    /// Minimum spacing between upstream requests (demo tier rate limit)
    pub request_interval_ms: u64,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    pub default_limit: usize,
    pub scan_cache_ttl_secs: u64,
    pub detail_cache_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            api_key: None,
            request_interval_ms: 1500,
            timeout_secs: 30,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            scan_cache_ttl_secs: 120,
            detail_cache_ttl_secs: 180,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {path}"))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {path}"))?;
        Ok(config)
    }

    /// Load config from `path` if it exists, otherwise use defaults.
    /// Environment variables override the file in either case.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if std::path::Path::new(path).exists() {
            info!(path = %path, "Loading configuration from file");
            Self::load_from_file(path)?
        } else {
            info!("No config file found - using defaults");
            Self::default()
        };

        if let Ok(key) = std::env::var("COINGECKO_API_KEY") {
            if !key.is_empty() {
                config.coingecko.api_key = Some(key);
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                config.server.port = port;
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.coingecko.request_interval_ms, 1500);
        assert_eq!(config.scanner.default_limit, 50);
        assert!(config.coingecko.api_key.is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nbind = \"127.0.0.1\"\nport = 8080\n\n[coingecko]\nbase_url = \"http://localhost:9999\"\napi_key = \"test-key\"\nrequest_interval_ms = 0\ntimeout_secs = 5"
        )
        .unwrap();

        let config = Config::load_from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.coingecko.api_key.as_deref(), Some("test-key"));
        // Section missing from the file falls back to defaults
        assert_eq!(config.scanner.scan_cache_ttl_secs, 120);
    }
}
