//! Application configuration for qabase.
//!
//! User config lives at `~/.qabase/qabase.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{QaBaseError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "qabase.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".qabase";

// ---------------------------------------------------------------------------
// Config structs (matching qabase.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database location.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Search tuning.
    #[serde(default)]
    pub search: SearchConfig,

    /// Listing limits.
    #[serde(default)]
    pub listing: ListingConfig,

    /// Voice transcription service.
    #[serde(default)]
    pub transcription: TranscriptionConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the moderation API binds to.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Largest accepted request body (CSV files, audio uploads).
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".into()
}
fn default_max_body_bytes() -> usize {
    25 * 1024 * 1024
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file. A leading `~/` expands to the home directory.
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "~/.qabase/qabase.db".into()
}

impl StorageConfig {
    /// Resolve `path`, expanding a leading `~/`.
    pub fn resolved_path(&self) -> Result<PathBuf> {
        expand_home(&self.path)
    }
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum number of entries a search returns.
    #[serde(default = "default_result_limit")]
    pub result_limit: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            result_limit: default_result_limit(),
        }
    }
}

fn default_result_limit() -> u32 {
    10
}

/// `[listing]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Page size when a listing request names no limit.
    #[serde(default = "default_listing_limit")]
    pub default_limit: u32,

    /// Upper bound on any requested limit.
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_limit: default_listing_limit(),
            max_limit: default_max_limit(),
        }
    }
}

fn default_listing_limit() -> u32 {
    100
}
fn default_max_limit() -> u32 {
    1000
}

impl ListingConfig {
    /// Apply the default and clamp to the maximum.
    pub fn effective_limit(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit.max(1))
    }
}

/// `[transcription]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// HTTP endpoint that turns audio into text. Voice intake is disabled when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Name of the env var holding the service token (never store the token itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Seconds to wait for a transcript before giving up.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_key_env() -> String {
    "QABASE_TRANSCRIBE_KEY".into()
}
fn default_timeout_secs() -> u64 {
    30
}

impl TranscriptionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// The token from the configured env var, if set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|v| !v.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.qabase/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| QaBaseError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.qabase/qabase.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| QaBaseError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| QaBaseError::config(format!("failed to parse {}: {e}", path.display())))?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| QaBaseError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| QaBaseError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| QaBaseError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject values that would make the server unusable.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.server.bind.trim().is_empty() {
        return Err(QaBaseError::config("server.bind must not be empty"));
    }
    if config.search.result_limit == 0 {
        return Err(QaBaseError::config("search.result_limit must be at least 1"));
    }
    if config.listing.default_limit > config.listing.max_limit {
        return Err(QaBaseError::config(
            "listing.default_limit must not exceed listing.max_limit",
        ));
    }
    if config
        .transcription
        .endpoint
        .as_deref()
        .is_some_and(|e| e.trim().is_empty())
    {
        return Err(QaBaseError::config(
            "transcription.endpoint is set but empty; remove it to disable voice intake",
        ));
    }
    Ok(())
}

/// Expand a leading `~/` against the home directory.
fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| QaBaseError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("bind"));
        assert!(toml_str.contains("QABASE_TRANSCRIBE_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.search.result_limit, 10);
        assert_eq!(parsed.server.bind, "127.0.0.1:8000");
        assert!(parsed.transcription.endpoint.is_none());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[server]
bind = "0.0.0.0:9000"

[transcription]
endpoint = "http://localhost:9100/transcribe"
timeout_secs = 5
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.server.max_body_bytes, 25 * 1024 * 1024);
        assert_eq!(config.transcription.timeout(), Duration::from_secs(5));
        assert_eq!(config.listing.default_limit, 100);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn listing_limit_is_clamped() {
        let listing = ListingConfig::default();
        assert_eq!(listing.effective_limit(None), 100);
        assert_eq!(listing.effective_limit(Some(0)), 1);
        assert_eq!(listing.effective_limit(Some(50_000)), 1000);
    }

    #[test]
    fn validation_rejects_zero_search_limit() {
        let mut config = AppConfig::default();
        config.search.result_limit = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("result_limit"));
    }

    #[test]
    fn load_from_file_validates() {
        let tmp = std::env::temp_dir().join(format!("qb_test_{}.toml", uuid::Uuid::now_v7()));
        std::fs::write(&tmp, "[server]\nbind = \"\"\n").unwrap();
        let result = load_config_from(&tmp);
        assert!(result.is_err());
        std::fs::remove_file(&tmp).ok();
    }

    #[test]
    fn absolute_storage_path_is_kept() {
        let storage = StorageConfig {
            path: "/var/lib/qabase/kb.db".into(),
        };
        assert_eq!(
            storage.resolved_path().unwrap(),
            PathBuf::from("/var/lib/qabase/kb.db")
        );
    }

    #[test]
    fn api_key_missing_env_is_none() {
        let config = TranscriptionConfig {
            api_key_env: "QB_TEST_NONEXISTENT_KEY_12345".into(),
            ..TranscriptionConfig::default()
        };
        assert!(config.api_key().is_none());
    }
}
