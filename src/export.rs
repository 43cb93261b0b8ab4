//! Left join of the full record collection with the ledger, written as CSV.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::db::{snapshot, LedgerSnapshot, LedgerStore};
use crate::models::{LedgerEntry, Record};

/// Extra columns appended after the record fields.
pub const LEDGER_COLUMNS: [&str; 2] = ["validation", "commentaire"];

/// One exported line: a record and its decision, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportRow<'a> {
    pub record: &'a Record,
    pub entry: Option<&'a LedgerEntry>,
}

/// Pair every record with its ledger entry. Output order and length follow
/// `records`; entries for unknown identifiers are dropped.
pub fn merge<'a>(records: &'a [Record], ledger: &'a LedgerSnapshot) -> Vec<ExportRow<'a>> {
    records
        .iter()
        .map(|record| ExportRow {
            record,
            entry: ledger.get(&record.cleabs),
        })
        .collect()
}

/// Serialize merged rows with a header. Missing decisions and comments are
/// written as empty cells.
pub fn write_csv<W: Write>(rows: &[ExportRow<'_>], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let header = Record::COLUMNS.iter().chain(LEDGER_COLUMNS.iter());
    wtr.write_record(header)
        .context("failed to write export header")?;

    for row in rows {
        let status = row.entry.map(|e| e.status.label()).unwrap_or_default();
        let comment = row
            .entry
            .and_then(|e| e.comment.as_deref())
            .unwrap_or_default();

        let values = row.record.values();
        let line = values
            .iter()
            .map(String::as_str)
            .chain([status, comment]);
        wtr.write_record(line)
            .with_context(|| format!("failed to write export row {}", row.record.cleabs))?;
    }

    wtr.flush().context("failed to flush export")?;
    Ok(())
}

/// Scan the ledger, merge it with `records`, and write the result to `path`.
/// Returns the number of rows written.
pub fn export_to_path<S: LedgerStore + ?Sized>(
    records: &[Record],
    store: &S,
    path: &Path,
) -> Result<usize> {
    let ledger = snapshot(store).context("failed to scan ledger for export")?;
    let rows = merge(records, &ledger);

    let file = File::create(path)
        .with_context(|| format!("failed to create export file {}", path.display()))?;
    write_csv(&rows, BufWriter::new(file))?;

    let reviewed = rows.iter().filter(|row| row.entry.is_some()).count();
    info!(
        path = %path.display(),
        rows = rows.len(),
        reviewed,
        "export written"
    );
    Ok(rows.len())
}
