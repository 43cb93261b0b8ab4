use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::error::LedgerError;

/// Upper bound on how long a statement waits for another process holding the
/// database lock before failing with `SQLITE_BUSY`.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed ledger. Wraps a single connection; every write is one
/// statement, so SQLite's own locking gives row-level atomicity.
pub struct SqliteLedger {
    pub(super) conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteLedger {
    /// Open (or create) the ledger file and make sure the `validation` table
    /// exists. Missing parent directories are created on the way.
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        ensure_parent_dir(path)?;

        let conn = Connection::open(path).map_err(|source| LedgerError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|source| LedgerError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let ledger = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        ledger.ensure_schema()?;
        debug!(path = %path.display(), "ledger opened");
        Ok(ledger)
    }

    /// Open a ledger that must already exist, read-only. Nothing is created,
    /// so a mistyped path fails instead of yielding an empty ledger.
    pub fn open_existing(path: &Path) -> Result<Self, LedgerError> {
        if !path.is_file() {
            return Err(LedgerError::Missing {
                path: path.to_path_buf(),
            });
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|source| LedgerError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|source| LedgerError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(path = %path.display(), "ledger opened read-only");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Throwaway ledger living only in memory. Used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory().map_err(|source| LedgerError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let ledger = Self { conn, path: None };
        ledger.ensure_schema()?;
        Ok(ledger)
    }

    /// Location of the backing file, `None` for in-memory ledgers.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn ensure_schema(&self) -> Result<(), LedgerError> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS validation (
                    cleabs TEXT PRIMARY KEY,
                    validation TEXT,
                    commentaire TEXT DEFAULT NULL
                )",
                [],
            )
            .map_err(LedgerError::Schema)?;
        Ok(())
    }
}

/// Create the directory that will hold `path`, if it has one.
pub fn ensure_parent_dir(path: &Path) -> Result<(), LedgerError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| LedgerError::Directory {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}
