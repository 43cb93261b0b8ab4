//! Persistence layer for review decisions, split across logical submodules.

mod connection;
mod ledger;
mod memory;
mod store;

pub use connection::{ensure_parent_dir, SqliteLedger, BUSY_TIMEOUT};
pub use memory::MemoryLedger;
pub use store::{snapshot, LedgerSnapshot, LedgerStore};
