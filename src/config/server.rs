use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

pub const CONFIG_FILE_NAME: &str = "studyhall.toml";
pub const WEATHER_API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// How long a storage call may wait on a database lock before failing
    /// with a retryable error.
    pub storage_timeout_ms: u64,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub upstream: UpstreamConfig,
}

/// Base URLs and credentials for the third-party APIs proxied by the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub dog_api_url: String,
    pub cat_api_url: String,
    pub weather_api_url: String,
    pub weather_api_key: Option<String>,
    pub timeout_secs: u64,
}

impl ServerConfig {
    /// Reads a TOML config file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Loads `path` if given, otherwise `<data_dir>/studyhall.toml` when it
    /// exists, otherwise defaults rooted at `data_dir`.
    pub fn load(path: Option<&Path>, data_dir: &Path) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = data_dir.join(CONFIG_FILE_NAME);
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };
        if path.is_none() {
            config.data_dir = data_dir.to_path_buf();
        }
        Ok(config)
    }

    /// Applies the weather API key from the environment, if set.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(WEATHER_API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.upstream.weather_api_key = Some(key);
            }
        }
        self
    }

    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("studyhall.db")
    }

    #[must_use]
    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }

    #[must_use]
    pub fn token_ttls(&self) -> TokenTtls {
        TokenTtls {
            access: chrono::Duration::seconds(self.access_token_ttl_secs),
            refresh: chrono::Duration::seconds(self.refresh_token_ttl_secs),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            data_dir: PathBuf::from("./data"),
            storage_timeout_ms: 5_000,
            access_token_ttl_secs: 5 * 60,
            refresh_token_ttl_secs: 24 * 60 * 60,
            upstream: UpstreamConfig::default(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            dog_api_url: "https://dog.ceo/api/breeds/image/random".to_string(),
            cat_api_url: "https://http.cat".to_string(),
            weather_api_url: "http://api.openweathermap.org/data/2.5/weather".to_string(),
            weather_api_key: None,
            timeout_secs: 10,
        }
    }
}

impl UpstreamConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Lifetimes of issued tokens.
#[derive(Debug, Clone, Copy)]
pub struct TokenTtls {
    pub access: chrono::Duration,
    pub refresh: chrono::Duration,
}

impl Default for TokenTtls {
    fn default() -> Self {
        ServerConfig::default().token_ttls()
    }
}
