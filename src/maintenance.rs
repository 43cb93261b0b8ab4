//! Ledger housekeeping: connection self-test and copying decisions between
//! ledger files.

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::db::{LedgerStore, SqliteLedger};
use crate::models::ReviewStatus;

/// Identifier used by the self-test probe row. Removed again before
/// [`check_ledger`] returns.
pub const PROBE_CLEABS: &str = "TEST_CONNEXION";

/// Result of a successful self-test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    /// Decisions stored before the probe ran.
    pub rows: i64,
}

/// Count rows, then write, read back, and delete a probe row.
///
/// Refuses to run if a real building already uses the probe identifier so a
/// genuine decision is never deleted.
pub fn check_ledger(ledger: &mut SqliteLedger) -> Result<CheckReport> {
    let rows = ledger.count().context("failed to count stored decisions")?;

    if ledger.get(PROBE_CLEABS)?.is_some() {
        bail!("a decision for {PROBE_CLEABS} already exists; not overwriting it");
    }

    ledger
        .upsert(PROBE_CLEABS, ReviewStatus::Validated, Some("connection test"))
        .context("probe write failed")?;
    // Remove the probe row even when reading it back failed.
    let read_back = ledger.get(PROBE_CLEABS);
    let removed = ledger.delete(PROBE_CLEABS);
    let read_back = read_back.context("probe read failed")?;
    removed.context("failed to remove probe row")?;

    match read_back {
        Some(entry) if entry.comment.as_deref() == Some("connection test") => {
            info!(rows, "ledger check passed");
            Ok(CheckReport { rows })
        }
        other => bail!("probe row read back as {other:?}"),
    }
}

/// Copy every decision from `source` into `target`. Identifiers present in
/// both take the source's status and comment. Returns the number of entries
/// copied.
pub fn import_ledger<S, T>(source: &S, target: &mut T) -> Result<usize>
where
    S: LedgerStore + ?Sized,
    T: LedgerStore + ?Sized,
{
    let entries = source.scan_all().context("failed to read source ledger")?;
    for entry in &entries {
        target
            .upsert(&entry.cleabs, entry.status.clone(), entry.comment.as_deref())
            .with_context(|| format!("failed to import {}", entry.cleabs))?;
    }
    info!(count = entries.len(), "ledger entries imported");
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryLedger;
    use crate::models::LedgerEntry;

    #[test]
    fn check_leaves_no_trace() {
        let mut ledger = SqliteLedger::open_in_memory().unwrap();
        ledger.upsert("A", ReviewStatus::Rejected, None).unwrap();

        let report = check_ledger(&mut ledger).unwrap();
        assert_eq!(report.rows, 1);
        assert_eq!(ledger.count().unwrap(), 1);
        assert_eq!(ledger.get(PROBE_CLEABS).unwrap(), None);
    }

    #[test]
    fn check_refuses_to_clobber_a_real_row() {
        let mut ledger = SqliteLedger::open_in_memory().unwrap();
        ledger
            .upsert(PROBE_CLEABS, ReviewStatus::Rejected, Some("real"))
            .unwrap();

        assert!(check_ledger(&mut ledger).is_err());
        assert_eq!(
            ledger.get(PROBE_CLEABS).unwrap(),
            Some(LedgerEntry::new(
                PROBE_CLEABS,
                ReviewStatus::Rejected,
                Some("real".into())
            ))
        );
    }

    #[test]
    fn import_overwrites_conflicts_and_keeps_the_rest() {
        let mut source = MemoryLedger::new();
        source.upsert("A", ReviewStatus::Rejected, Some("ruine")).unwrap();
        source.upsert("B", ReviewStatus::Validated, None).unwrap();

        let mut target = SqliteLedger::open_in_memory().unwrap();
        target.upsert("A", ReviewStatus::Validated, None).unwrap();
        target.upsert("C", ReviewStatus::Validated, None).unwrap();

        assert_eq!(import_ledger(&source, &mut target).unwrap(), 2);
        assert_eq!(target.count().unwrap(), 3);
        assert_eq!(
            target.get("A").unwrap().unwrap().comment.as_deref(),
            Some("ruine")
        );
    }

    #[test]
    fn failed_read_back_still_cleans_up_the_test_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.sqlite");
        let mut ledger = SqliteLedger::open(&path).unwrap();
        // Turn the stored comment into a blob so it can no longer be read as text.
        rusqlite::Connection::open(&path)
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER corrupt_test_row AFTER INSERT ON validation
                 WHEN NEW.cleabs = 'TEST_CONNEXION'
                 BEGIN
                     UPDATE validation SET commentaire = X'FF00' WHERE cleabs = NEW.cleabs;
                 END;",
            )
            .unwrap();

        assert!(check_ledger(&mut ledger).is_err());
        assert_eq!(ledger.count().unwrap(), 0);
    }

    #[test]
    fn import_carries_foreign_labels_over() {
        let mut source = MemoryLedger::new();
        source
            .upsert(PROBE_CLEABS, ReviewStatus::Other("Test".into()), None)
            .unwrap();
        let mut target = SqliteLedger::open_in_memory().unwrap();

        assert_eq!(import_ledger(&source, &mut target).unwrap(), 1);
        assert_eq!(
            target.get(PROBE_CLEABS).unwrap().map(|entry| entry.status),
            Some(ReviewStatus::Other("Test".into()))
        );
    }
}
