//! Typed failures raised by the ledger store.

use std::path::PathBuf;

use thiserror::Error;

/// Persistence errors. The UI reports these in its footer and leaves the
/// review session untouched; nothing is retried automatically.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The SQLite file could not be opened or configured.
    #[error("failed to open ledger database at {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Creating the directory that holds the ledger file failed.
    #[error("failed to create ledger directory {path}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `CREATE TABLE IF NOT EXISTS validation` was rejected.
    #[error("failed to create validation table")]
    Schema(#[source] rusqlite::Error),

    /// The store refused an upsert or delete.
    #[error("failed to write review for {cleabs}")]
    Write {
        cleabs: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A query against the store failed.
    #[error("failed to read validation table")]
    Read(#[source] rusqlite::Error),

    /// An existing ledger was required but nothing is at `path`.
    #[error("no ledger database at {path}")]
    Missing { path: PathBuf },
}
