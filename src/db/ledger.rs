use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, warn};

use crate::error::LedgerError;
use crate::models::{LedgerEntry, ReviewStatus};

use super::connection::SqliteLedger;
use super::store::LedgerStore;

impl LedgerStore for SqliteLedger {
    /// Single `INSERT ... ON CONFLICT DO UPDATE` statement so status and
    /// comment always change together.
    fn upsert(
        &mut self,
        cleabs: &str,
        status: ReviewStatus,
        comment: Option<&str>,
    ) -> Result<(), LedgerError> {
        self.conn
            .execute(
                "INSERT INTO validation (cleabs, validation, commentaire)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(cleabs) DO UPDATE SET
                     validation = excluded.validation,
                     commentaire = excluded.commentaire",
                params![cleabs, status.label(), comment],
            )
            .map_err(|source| LedgerError::Write {
                cleabs: cleabs.to_string(),
                source,
            })?;
        debug!(cleabs, status = status.label(), "review stored");
        Ok(())
    }

    fn get(&self, cleabs: &str) -> Result<Option<LedgerEntry>, LedgerError> {
        let raw = self
            .conn
            .query_row(
                "SELECT cleabs, validation, commentaire FROM validation WHERE cleabs = ?1",
                params![cleabs],
                read_raw_row,
            )
            .optional()
            .map_err(LedgerError::Read)?;

        Ok(raw.map(RawRow::into_entry))
    }

    fn scan_all(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut stmt = self
            .conn
            .prepare("SELECT cleabs, validation, commentaire FROM validation ORDER BY cleabs")
            .map_err(LedgerError::Read)?;

        let rows = stmt
            .query_map([], read_raw_row)
            .map_err(LedgerError::Read)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(LedgerError::Read)?;

        Ok(rows.into_iter().map(RawRow::into_entry).collect())
    }
}

impl SqliteLedger {
    /// Number of stored decisions.
    pub fn count(&self) -> Result<i64, LedgerError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM validation", [], |row| row.get(0))
            .map_err(LedgerError::Read)
    }

    /// Drop the decision for `cleabs`, returning whether a row existed. This
    /// turns the building back into "unevaluated".
    pub fn delete(&mut self, cleabs: &str) -> Result<bool, LedgerError> {
        let deleted = self
            .conn
            .execute("DELETE FROM validation WHERE cleabs = ?1", params![cleabs])
            .map_err(|source| LedgerError::Write {
                cleabs: cleabs.to_string(),
                source,
            })?;
        Ok(deleted > 0)
    }
}

/// Row as stored, before the status label is validated.
struct RawRow {
    cleabs: String,
    validation: Option<String>,
    comment: Option<String>,
}

fn read_raw_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        cleabs: row.get(0)?,
        validation: row.get(1)?,
        comment: row.get(2)?,
    })
}

impl RawRow {
    fn into_entry(self) -> LedgerEntry {
        let label = self.validation.unwrap_or_default();
        let status = ReviewStatus::from_label(&label);
        if !status.is_known() {
            warn!(cleabs = %self.cleabs, label = %label, "ledger row has an unrecognised status");
        }
        LedgerEntry {
            cleabs: self.cleabs,
            status,
            comment: self.comment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::snapshot;

    fn ledger() -> SqliteLedger {
        SqliteLedger::open_in_memory().expect("in-memory ledger")
    }

    #[test]
    fn get_on_empty_ledger_is_absent() {
        let ledger = ledger();
        assert_eq!(ledger.get("A").unwrap(), None);
        assert!(ledger.scan_all().unwrap().is_empty());
    }

    #[test]
    fn repeated_upsert_is_idempotent() {
        let mut ledger = ledger();
        ledger
            .upsert("A", ReviewStatus::Validated, Some("ok"))
            .unwrap();
        let once = ledger.get("A").unwrap();
        ledger
            .upsert("A", ReviewStatus::Validated, Some("ok"))
            .unwrap();

        assert_eq!(ledger.get("A").unwrap(), once);
        assert_eq!(ledger.count().unwrap(), 1);
    }

    #[test]
    fn second_write_replaces_the_whole_row() {
        let mut ledger = ledger();
        ledger
            .upsert("X001", ReviewStatus::Validated, Some("ok"))
            .unwrap();
        ledger.upsert("X001", ReviewStatus::Rejected, None).unwrap();

        assert_eq!(
            ledger.get("X001").unwrap(),
            Some(LedgerEntry::new("X001", ReviewStatus::Rejected, None))
        );
    }

    #[test]
    fn scan_holds_one_row_per_identifier() {
        let mut ledger = ledger();
        for (id, status) in [
            ("A", ReviewStatus::Validated),
            ("B", ReviewStatus::Rejected),
            ("A", ReviewStatus::Rejected),
            ("B", ReviewStatus::Rejected),
            ("C", ReviewStatus::Validated),
        ] {
            ledger.upsert(id, status, None).unwrap();
        }

        let entries = ledger.scan_all().unwrap();
        assert_eq!(entries.len(), 3);
        let map = snapshot(&ledger).unwrap();
        assert_eq!(map["A"].status, ReviewStatus::Rejected);
    }

    #[test]
    fn foreign_labels_are_kept_verbatim() {
        let mut ledger = ledger();
        ledger.upsert("A", ReviewStatus::Validated, None).unwrap();
        ledger
            .conn
            .execute(
                "INSERT INTO validation (cleabs, validation, commentaire)
                 VALUES ('TEST_CONNEXION', 'Test', 'Ceci est un test')",
                [],
            )
            .unwrap();
        ledger
            .conn
            .execute("INSERT INTO validation (cleabs) VALUES ('N')", [])
            .unwrap();

        assert_eq!(
            ledger.get("TEST_CONNEXION").unwrap(),
            Some(LedgerEntry::new(
                "TEST_CONNEXION",
                ReviewStatus::Other("Test".into()),
                Some("Ceci est un test".into())
            ))
        );
        assert_eq!(
            ledger.get("N").unwrap().map(|entry| entry.status),
            Some(ReviewStatus::Other(String::new()))
        );

        let entries = ledger.scan_all().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].status, ReviewStatus::Validated);
    }

    #[test]
    fn delete_reports_whether_a_row_existed() {
        let mut ledger = ledger();
        ledger.upsert("A", ReviewStatus::Validated, None).unwrap();
        assert!(ledger.delete("A").unwrap());
        assert!(!ledger.delete("A").unwrap());
        assert_eq!(ledger.get("A").unwrap(), None);
    }
}
