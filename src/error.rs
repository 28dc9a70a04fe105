use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Watch(#[from] WatchError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Failures of the text index. `Open` is fatal: without an index the
/// engine cannot serve search.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("failed to open text index at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to prepare text index schema: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("index write failed: {0}")]
    Write(#[source] sqlx::Error),

    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),
}

impl IndexError {
    /// True when the query text itself was rejected by the FTS5 parser,
    /// as opposed to the database failing.
    pub fn is_query_syntax(&self) -> bool {
        let IndexError::Query(sqlx::Error::Database(db)) = self else {
            return false;
        };
        let message = db.message();
        message.contains("fts5")
            || message.contains("syntax error")
            || message.contains("no such column")
            || message.contains("unterminated string")
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is outside the vault root")]
    OutsideVault { path: PathBuf },

    #[error("{path} is not valid UTF-8 and cannot be keyed")]
    NonUtf8Path { path: PathBuf },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("fingerprint store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("fingerprint store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to watch {path}: {source}")]
    Subscribe {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("watcher is already subscribed")]
    AlreadySubscribed,
}

pub type VaultResult<T> = Result<T, VaultError>;
