//! Engine configuration.
//!
//! Every field has a default so a partial config (or none at all) still
//! yields a working engine. [`EngineConfig::from_env`] layers the
//! `VAULT_*` environment variables on top of those defaults.

use crate::error::VaultError;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const FINGERPRINT_FILE: &str = "index_state.json";
const INDEX_DB_FILE: &str = "index.db";

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Root of the document tree kept searchable.
    #[serde(default = "default_vault_path")]
    pub vault_path: PathBuf,

    /// Directory holding the text index and the fingerprint store.
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Eligible file extensions, compared case-insensitively and without the dot.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Coalescing window of the debounce processor.
    #[serde(default = "default_debounce", with = "millis")]
    pub debounce: Duration,

    #[serde(default = "default_limit")]
    pub default_limit: usize,

    #[serde(default = "default_max_limit")]
    pub max_limit: usize,

    /// Bounded wait for the debounce loop during shutdown.
    #[serde(default = "default_shutdown_timeout", with = "millis")]
    pub shutdown_timeout: Duration,
}

fn default_vault_path() -> PathBuf {
    PathBuf::from("/data/vault")
}

fn default_index_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("vault-core").join("search_index"))
        .unwrap_or_else(|| PathBuf::from("/data/search_index"))
}

fn default_extensions() -> Vec<String> {
    vec!["md".to_string(), "txt".to_string(), "pdf".to_string()]
}

fn default_debounce() -> Duration {
    Duration::from_secs(3)
}

fn default_limit() -> usize {
    10
}

fn default_max_limit() -> usize {
    100
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(5)
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vault_path: default_vault_path(),
            index_path: default_index_path(),
            extensions: default_extensions(),
            debounce: default_debounce(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

impl EngineConfig {
    /// Creates a config for the given vault and index directory, other
    /// fields at their defaults.
    pub fn new(vault_path: impl Into<PathBuf>, index_path: impl Into<PathBuf>) -> Self {
        Self {
            vault_path: vault_path.into(),
            index_path: index_path.into(),
            ..Default::default()
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Builds a config from defaults overridden by the process environment.
    ///
    /// Recognized variables: `VAULT_PATH`, `VAULT_INDEX_PATH`,
    /// `VAULT_DEBOUNCE_MS` and `VAULT_SEARCH_LIMIT`. A search limit above
    /// the default maximum raises the maximum to match.
    pub fn from_env() -> Result<Self, VaultError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, VaultError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("VAULT_PATH") {
            config.vault_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("VAULT_INDEX_PATH") {
            config.index_path = PathBuf::from(path);
        }
        if let Some(ms) = lookup("VAULT_DEBOUNCE_MS") {
            let ms: u64 = ms
                .parse()
                .map_err(|_| VaultError::Config(format!("VAULT_DEBOUNCE_MS: {ms:?}")))?;
            config.debounce = Duration::from_millis(ms);
        }
        if let Some(limit) = lookup("VAULT_SEARCH_LIMIT") {
            config.default_limit = limit
                .parse()
                .map_err(|_| VaultError::Config(format!("VAULT_SEARCH_LIMIT: {limit:?}")))?;
            config.max_limit = config.max_limit.max(config.default_limit);
        }

        config.validate()?;
        Ok(config)
    }

    /// Rejects configs the engine cannot run with.
    pub fn validate(&self) -> Result<(), VaultError> {
        if self.debounce.is_zero() {
            return Err(VaultError::Config("debounce interval must be non-zero".into()));
        }
        if self.extensions.is_empty() {
            return Err(VaultError::Config("extension whitelist is empty".into()));
        }
        if self.default_limit > self.max_limit {
            return Err(VaultError::Config(format!(
                "default limit {} exceeds max limit {}",
                self.default_limit, self.max_limit
            )));
        }
        Ok(())
    }

    pub fn fingerprint_file(&self) -> PathBuf {
        self.index_path.join(FINGERPRINT_FILE)
    }

    pub fn index_db_file(&self) -> PathBuf {
        self.index_path.join(INDEX_DB_FILE)
    }
}
