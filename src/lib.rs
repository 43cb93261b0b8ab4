//! Review ledger for an agricultural building survey.
//!
//! Buildings selected from cadastral/topographic data are stepped through one
//! at a time; each decision is upserted into a SQLite `validation` table keyed
//! by `cleabs`, and the full building list can be exported with its
//! decisions left-joined in.
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod filter;
pub mod logging;
pub mod maintenance;
pub mod models;
pub mod records;
pub mod session;
pub mod survey;
pub mod ui;

/// Ledger storage: the store contract plus its SQLite and in-memory backends.
pub use db::{LedgerStore, MemoryLedger, SqliteLedger};

pub use error::LedgerError;
pub use export::{export_to_path, merge};
pub use filter::{RecordFilter, StatusFilter};
pub use models::{LedgerEntry, Record, ReviewStatus};
pub use records::load_records;
pub use session::{ReviewSession, SessionState};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
