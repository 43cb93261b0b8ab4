use std::collections::HashMap;

use crate::error::LedgerError;
use crate::models::{LedgerEntry, ReviewStatus};

use super::store::LedgerStore;

/// Ledger kept in a `HashMap`. Same contract as the SQLite store, minus
/// durability; handy for tests and previews.
#[derive(Debug, Default, Clone)]
pub struct MemoryLedger {
    entries: HashMap<String, LedgerEntry>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LedgerStore for MemoryLedger {
    fn upsert(
        &mut self,
        cleabs: &str,
        status: ReviewStatus,
        comment: Option<&str>,
    ) -> Result<(), LedgerError> {
        self.entries.insert(
            cleabs.to_string(),
            LedgerEntry::new(cleabs, status, comment.map(str::to_string)),
        );
        Ok(())
    }

    fn get(&self, cleabs: &str) -> Result<Option<LedgerEntry>, LedgerError> {
        Ok(self.entries.get(cleabs).cloned())
    }

    fn scan_all(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        Ok(self.entries.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_write_wins_without_merging() {
        let mut ledger = MemoryLedger::new();
        ledger
            .upsert("X001", ReviewStatus::Validated, Some("ok"))
            .unwrap();
        ledger.upsert("X001", ReviewStatus::Rejected, None).unwrap();

        assert_eq!(ledger.len(), 1);
        assert_eq!(
            ledger.get("X001").unwrap(),
            Some(LedgerEntry::new("X001", ReviewStatus::Rejected, None))
        );
    }
}
