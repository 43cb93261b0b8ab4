//! Loading the review input: the building table exported for Kepler, one row
//! per building with its centroid and categorical attributes.

use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::models::Record;

/// Read every record from a CSV file on disk.
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open record file {}", path.display()))?;
    let records = read_records(file)
        .with_context(|| format!("failed to load records from {}", path.display()))?;
    info!(path = %path.display(), count = records.len(), "records loaded");
    Ok(records)
}

/// Parse records from any CSV source. Extra columns are ignored; a repeated
/// `cleabs` is rejected because it would break the one-row-per-building
/// export.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<Record>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for (line, row) in csv_reader.deserialize::<Record>().enumerate() {
        // Header is line 1.
        let record = row.with_context(|| format!("invalid record on line {}", line + 2))?;
        if record.cleabs.trim().is_empty() {
            bail!("record on line {} has an empty cleabs", line + 2);
        }
        if !seen.insert(record.cleabs.clone()) {
            bail!("duplicate cleabs {} on line {}", record.cleabs, line + 2);
        }
        records.push(record);
    }

    Ok(records)
}

/// Choices offered by the filter panel: the distinct, non-empty values of
/// each categorical column, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub natures: Vec<String>,
    pub etats: Vec<String>,
}

impl FilterOptions {
    pub fn from_records(records: &[Record]) -> Self {
        Self {
            natures: distinct(records, |r| r.nature.as_str()),
            etats: distinct(records, |r| r.etat_de_l_objet.as_str()),
        }
    }
}

fn distinct(records: &[Record], pick: fn(&Record) -> &str) -> Vec<String> {
    records
        .iter()
        .map(pick)
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
cleabs,lat,lon,google_maps,usage_1,nature,etat_de_l_objet,extra
A,43.91,3.70,\"https://www.google.com/maps?q=43.91,3.70\",Agricole,Serre,En service,x
B,43.92,3.71,,Agricole,,En ruine,y
C,43.93,3.72,,Agricole,Silo,En service,z
";

    #[test]
    fn reads_rows_and_ignores_unknown_columns() {
        let records = read_records(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].cleabs, "A");
        assert_eq!(records[1].nature, "");
        assert_eq!(records[2].lon, 3.72);
    }

    #[test]
    fn duplicate_identifier_is_rejected() {
        let data = "cleabs,lat,lon\nA,1,2\nA,3,4\n";
        let err = read_records(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("duplicate cleabs A"));
    }

    #[test]
    fn options_are_distinct_sorted_and_skip_blanks() {
        let records = read_records(SAMPLE.as_bytes()).unwrap();
        let options = FilterOptions::from_records(&records);
        assert_eq!(options.natures, vec!["Serre", "Silo"]);
        assert_eq!(options.etats, vec!["En ruine", "En service"]);
    }
}
