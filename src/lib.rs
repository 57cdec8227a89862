//! Draft Board
//!
//! Keeps a fantasy draft board stored in an `.xlsx` workbook up to date while
//! players are drafted: one sheet per position plus a "Decision Matrix"
//! summary sheet with squad counters and ranking statistics.
//!
//! This library provides:
//! - `table`: the in-memory snapshot of the workbook
//! - `search`: case-insensitive player search
//! - `pending`: edits waiting to be written
//! - `reconcile`: writing pending edits back and reloading
//! - `stats`: top / threshold / diff statistics with stored-value priority
//! - `session`: a draft session tying the above together
//!
//! Binaries:
//! - `draft-board`: interactive draft manager and one-shot board queries

pub mod backup;
pub mod config;
pub mod error;
pub mod pending;
pub mod reconcile;
pub mod report;
pub mod search;
pub mod session;
pub mod stats;
pub mod storage;
pub mod summary;
pub mod table;
pub mod template;

pub use config::BoardConfig;
pub use error::{FlushError, FlushStage, InvalidCategoryError, LoadError, ParseWarning, SelectionError};
pub use pending::PendingEditSet;
pub use reconcile::{flush, FlushReport};
pub use search::{MatchBatch, MatchRecord};
pub use session::{DraftSession, Selection};
pub use table::{CellValue, RowId, Table, TableStore};
