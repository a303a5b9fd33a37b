use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid hash format: {0:?} (use md5, sha1, sha256 or sha512)")]
    InvalidHashFormat(String),

    #[error("No open session. This command expects a file to be open")]
    SessionRequired,

    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    Index(String),

    #[error("Storage error at {}: {source}", path.display())]
    StorageIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog constraint violated: {0}")]
    CatalogConstraint(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    pub fn storage_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::StorageIo {
            path: path.into(),
            source,
        }
    }

    /// True for conditions a front end reports as a warning rather than a failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::Index(_) | Error::SessionRequired
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
