//! Error types for the translation store.
//!
//! Cache failures are deliberately absent: the cache is best-effort and its
//! errors are logged and absorbed at the call site, never surfaced.

use thiserror::Error;

/// Library error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    /// Nothing saved yet for the requested key, or an unknown code/identity.
    #[error("{0}")]
    NotFound(String),

    /// The external translation engine failed (auth, quota, network,
    /// malformed response). The message carries the failing key path when
    /// the failure happened inside a structured translation.
    #[error("translation engine: {0}")]
    Engine(String),

    /// A backfill aborted while processing `locale`. Locales already
    /// completed before the failure remain persisted.
    #[error("backfill to {locale} failed: {source}")]
    Backfill {
        locale: String,
        #[source]
        source: Box<Error>,
    },

    /// Entity store failure on read or write. Fatal for the call; no
    /// internal retry.
    #[error("persistence: {0}")]
    Persistence(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("database error: {:?}", err);
        Error::Persistence(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
