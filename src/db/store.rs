use std::collections::HashMap;

use crate::error::LedgerError;
use crate::models::{LedgerEntry, ReviewStatus};

/// Durable mapping from a building identifier to its review decision.
///
/// Implementations must make `upsert` an insert-or-replace on the identifier:
/// the new status and comment overwrite the previous row as a whole, readers
/// never observe a mix of old and new fields, and concurrent writers resolve
/// as last-writer-wins.
pub trait LedgerStore {
    /// Insert the decision for `cleabs`, or overwrite the existing one.
    fn upsert(
        &mut self,
        cleabs: &str,
        status: ReviewStatus,
        comment: Option<&str>,
    ) -> Result<(), LedgerError>;

    /// Stored decision for `cleabs`. `Ok(None)` means the building has not
    /// been evaluated yet.
    fn get(&self, cleabs: &str) -> Result<Option<LedgerEntry>, LedgerError>;

    /// Every stored decision. Callers must not rely on the order.
    fn scan_all(&self) -> Result<Vec<LedgerEntry>, LedgerError>;
}

/// Point-in-time view of the ledger keyed by identifier.
pub type LedgerSnapshot = HashMap<String, LedgerEntry>;

/// Read the whole ledger once and index it by `cleabs`.
pub fn snapshot<S: LedgerStore + ?Sized>(store: &S) -> Result<LedgerSnapshot, LedgerError> {
    Ok(store
        .scan_all()?
        .into_iter()
        .map(|entry| (entry.cleabs.clone(), entry))
        .collect())
}
