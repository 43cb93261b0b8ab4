//! Narrowing the record collection to the buildings a reviewer wants to see.

use std::collections::BTreeSet;
use std::fmt;

use crate::db::LedgerSnapshot;
use crate::models::{Record, ReviewStatus};

/// Which review state a building must be in to stay visible.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    /// No ledger row exists for the building.
    Unevaluated,
    /// A ledger row exists with exactly this status. Rows with an
    /// unrecognised label never match a known status.
    Only(ReviewStatus),
}

/// Labels for the two filters that are not a stored status.
const ALL_LABEL: &str = "Tous";
const UNEVALUATED_LABEL: &str = "Non évalué";

impl StatusFilter {
    /// Cycle order used by the `s` shortcut.
    pub fn next(&self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Unevaluated,
            StatusFilter::Unevaluated => StatusFilter::Only(ReviewStatus::Validated),
            StatusFilter::Only(ReviewStatus::Validated) => {
                StatusFilter::Only(ReviewStatus::Rejected)
            }
            StatusFilter::Only(_) => StatusFilter::All,
        }
    }

    fn accepts(&self, status: Option<&ReviewStatus>) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Unevaluated => status.is_none(),
            StatusFilter::Only(wanted) => status == Some(wanted),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str(ALL_LABEL),
            StatusFilter::Unevaluated => f.write_str(UNEVALUATED_LABEL),
            StatusFilter::Only(status) => write!(f, "{status}"),
        }
    }
}

/// Active filter dimensions. Dimensions combine with AND; within `natures`
/// and `etats` a record matches if its value is any of the selected ones. An
/// empty set leaves that dimension unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub natures: BTreeSet<String>,
    pub etats: BTreeSet<String>,
    pub status: StatusFilter,
}

impl RecordFilter {
    pub fn matches(&self, record: &Record, ledger: &LedgerSnapshot) -> bool {
        (self.natures.is_empty() || self.natures.contains(&record.nature))
            && (self.etats.is_empty() || self.etats.contains(&record.etat_de_l_objet))
            && self
                .status
                .accepts(ledger.get(&record.cleabs).map(|entry| &entry.status))
    }

    /// Indices into `records` of every matching record, in input order.
    pub fn apply(&self, records: &[Record], ledger: &LedgerSnapshot) -> Vec<usize> {
        records
            .iter()
            .enumerate()
            .filter(|(_, record)| self.matches(record, ledger))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Add `value` to the nature selection, or remove it if already there.
    /// Returns whether it is selected afterwards.
    pub fn toggle_nature(&mut self, value: &str) -> bool {
        toggle(&mut self.natures, value)
    }

    pub fn toggle_etat(&mut self, value: &str) -> bool {
        toggle(&mut self.etats, value)
    }

    /// One-line summary for the sidebar.
    pub fn describe(&self) -> String {
        let list = |set: &BTreeSet<String>| {
            if set.is_empty() {
                "any".to_string()
            } else {
                set.iter().cloned().collect::<Vec<_>>().join(", ")
            }
        };
        format!(
            "nature: {} | état: {} | status: {}",
            list(&self.natures),
            list(&self.etats),
            self.status
        )
    }
}

fn toggle(set: &mut BTreeSet<String>, value: &str) -> bool {
    if set.remove(value) {
        false
    } else {
        set.insert(value.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{snapshot, LedgerStore, MemoryLedger};

    fn record(cleabs: &str, nature: &str, etat: &str) -> Record {
        Record {
            cleabs: cleabs.into(),
            lat: 43.9,
            lon: 3.7,
            google_maps: String::new(),
            usage_1: "Agricole".into(),
            nature: nature.into(),
            etat_de_l_objet: etat.into(),
        }
    }

    fn ids(records: &[Record], indices: &[usize]) -> Vec<String> {
        indices.iter().map(|&i| records[i].cleabs.clone()).collect()
    }

    #[test]
    fn unevaluated_shrinks_after_a_decision() {
        let records = vec![
            record("A", "Serre", "En service"),
            record("B", "Silo", "En service"),
            record("C", "Serre", "En ruine"),
        ];
        let mut ledger = MemoryLedger::new();
        let mut filter = RecordFilter {
            status: StatusFilter::Unevaluated,
            ..RecordFilter::default()
        };

        let view = snapshot(&ledger).unwrap();
        assert_eq!(ids(&records, &filter.apply(&records, &view)), ["A", "B", "C"]);

        ledger.upsert("A", ReviewStatus::Validated, None).unwrap();
        let view = snapshot(&ledger).unwrap();
        assert_eq!(ids(&records, &filter.apply(&records, &view)), ["B", "C"]);

        filter.status = StatusFilter::Only(ReviewStatus::Validated);
        assert_eq!(ids(&records, &filter.apply(&records, &view)), ["A"]);

        filter.status = StatusFilter::Only(ReviewStatus::Rejected);
        assert!(filter.apply(&records, &view).is_empty());
    }

    #[test]
    fn dimensions_combine_with_and_values_with_or() {
        let records = vec![
            record("A", "Serre", "En service"),
            record("B", "Silo", "En service"),
            record("C", "Serre", "En ruine"),
            record("D", "Bâtiment agricole", "Détruit"),
        ];
        let view = LedgerSnapshot::new();
        let mut filter = RecordFilter::default();
        filter.toggle_nature("Serre");
        filter.toggle_nature("Silo");
        assert_eq!(ids(&records, &filter.apply(&records, &view)), ["A", "B", "C"]);

        filter.toggle_etat("En ruine");
        assert_eq!(ids(&records, &filter.apply(&records, &view)), ["C"]);

        assert!(!filter.toggle_nature("Serre"));
        assert!(filter.apply(&records, &view).is_empty());
    }

    #[test]
    fn output_is_exactly_the_matching_records() {
        let natures = ["Serre", "Silo", ""];
        let etats = ["En service", "En ruine"];
        let mut records = Vec::new();
        for (n, nature) in natures.iter().enumerate() {
            for (e, etat) in etats.iter().enumerate() {
                records.push(record(&format!("R{n}{e}"), nature, etat));
            }
        }
        let mut ledger = MemoryLedger::new();
        ledger.upsert("R00", ReviewStatus::Validated, None).unwrap();
        ledger.upsert("R11", ReviewStatus::Rejected, Some("ruine")).unwrap();
        let view = snapshot(&ledger).unwrap();

        let statuses = [
            StatusFilter::All,
            StatusFilter::Unevaluated,
            StatusFilter::Only(ReviewStatus::Validated),
            StatusFilter::Only(ReviewStatus::Rejected),
        ];
        let nature_sets: [&[&str]; 3] = [&[], &["Serre"], &["Serre", "Silo"]];
        let etat_sets: [&[&str]; 2] = [&[], &["En ruine"]];

        for status in statuses {
            for nature_set in nature_sets {
                for etat_set in etat_sets {
                    let filter = RecordFilter {
                        natures: nature_set.iter().map(|s| s.to_string()).collect(),
                        etats: etat_set.iter().map(|s| s.to_string()).collect(),
                        status: status.clone(),
                    };
                    let kept = filter.apply(&records, &view);
                    for (idx, record) in records.iter().enumerate() {
                        assert_eq!(
                            kept.contains(&idx),
                            filter.matches(record, &view),
                            "{} with {}",
                            record.cleabs,
                            filter.describe()
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn status_cycle_visits_every_option() {
        let mut status = StatusFilter::All;
        let mut seen = vec![status.to_string()];
        for _ in 0..3 {
            status = status.next();
            seen.push(status.to_string());
        }
        assert_eq!(status.next(), StatusFilter::All);
        assert_eq!(seen, ["Tous", "Non évalué", "Validé", "Refusé"]);
    }

    #[test]
    fn foreign_label_counts_as_evaluated_only() {
        let records = vec![
            record("A", "Serre", "En service"),
            record("TEST_CONNEXION", "Serre", "En service"),
        ];
        let mut ledger = MemoryLedger::new();
        ledger
            .upsert("TEST_CONNEXION", ReviewStatus::Other("Test".into()), None)
            .unwrap();
        let view = snapshot(&ledger).unwrap();

        let mut filter = RecordFilter {
            status: StatusFilter::Unevaluated,
            ..RecordFilter::default()
        };
        assert_eq!(ids(&records, &filter.apply(&records, &view)), ["A"]);

        for status in ReviewStatus::ALL {
            filter.status = StatusFilter::Only(status);
            assert!(filter.apply(&records, &view).is_empty());
        }

        filter.status = StatusFilter::All;
        assert_eq!(filter.apply(&records, &view).len(), 2);
    }
}
