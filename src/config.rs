//! Where the ledger lives.
//!
//! Resolution order: explicit `--database` path, then `DATABASE_URL`, then a
//! file in the user's home directory.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use directories::BaseDirs;

/// Environment variable shared with the earlier survey scripts.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".agri-review";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "resultats_batiments.sqlite";
/// Log file written next to the ledger while the TUI owns the terminal.
const LOG_FILE_NAME: &str = "agri-review.log";

/// Pick the ledger path from the CLI flag, the environment, or the default.
pub fn resolve_database_path(flag: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }

    match std::env::var(DATABASE_URL_ENV) {
        Ok(url) if !url.trim().is_empty() => parse_database_url(&url),
        _ => default_database_path(),
    }
}

/// Turn a `DATABASE_URL` value into a filesystem path.
///
/// `sqlite:///rel/path` is relative to the working directory and
/// `sqlite:////abs/path` is absolute. A value without a scheme is taken as a
/// path as-is.
pub fn parse_database_url(url: &str) -> Result<PathBuf> {
    let url = url.trim();

    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        bail!("PostgreSQL ledgers are not supported; point {DATABASE_URL_ENV} at a SQLite file");
    }

    if let Some(rest) = url.strip_prefix("sqlite://") {
        let path = rest
            .strip_prefix('/')
            .ok_or_else(|| anyhow!("malformed SQLite URL `{url}`, expected sqlite:///path"))?;
        if path.is_empty() || path == ":memory:" {
            bail!("{DATABASE_URL_ENV} must name a SQLite file, got `{url}`");
        }
        return Ok(PathBuf::from(path));
    }

    if let Some((scheme, _)) = url.split_once("://") {
        bail!("unsupported database scheme `{scheme}`");
    }

    Ok(PathBuf::from(url))
}

/// `~/.agri-review/resultats_batiments.sqlite`.
pub fn default_database_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}

/// Log file path for interactive sessions, beside the ledger file.
pub fn log_file_path(database: &Path) -> PathBuf {
    database
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(|parent| parent.join(LOG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(LOG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_urls_map_to_paths() {
        assert_eq!(
            parse_database_url("sqlite:///resultats_batiments.sqlite").unwrap(),
            PathBuf::from("resultats_batiments.sqlite")
        );
        assert_eq!(
            parse_database_url("sqlite:////var/lib/survey/ledger.sqlite").unwrap(),
            PathBuf::from("/var/lib/survey/ledger.sqlite")
        );
        assert_eq!(
            parse_database_url(" data/ledger.sqlite ").unwrap(),
            PathBuf::from("data/ledger.sqlite")
        );
    }

    #[test]
    fn other_backends_are_rejected() {
        for url in [
            "postgres://user:pw@host/db",
            "postgresql://host/db",
            "mysql://host/db",
            "sqlite://",
            "sqlite:///:memory:",
        ] {
            assert!(parse_database_url(url).is_err(), "{url} should be rejected");
        }
    }

    #[test]
    fn flag_wins_over_environment() {
        let flag = PathBuf::from("custom.sqlite");
        assert_eq!(resolve_database_path(Some(flag.as_path())).unwrap(), flag);
    }

    #[test]
    fn log_file_sits_beside_the_ledger() {
        assert_eq!(
            log_file_path(Path::new("/tmp/x/ledger.sqlite")),
            PathBuf::from("/tmp/x/agri-review.log")
        );
        assert_eq!(
            log_file_path(Path::new("ledger.sqlite")),
            PathBuf::from("agri-review.log")
        );
    }
}
