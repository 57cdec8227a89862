//! Error types at the engine boundary.
//!
//! Storage backends report failures as `anyhow::Error` with context; the
//! engine wraps them into the typed errors below so callers can tell a fatal
//! load failure from a retryable flush failure.

use std::fmt;
use std::path::PathBuf;

/// The workbook could not be turned into a snapshot. Fatal at start-up.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read workbook {}: {source:#}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    #[error("workbook {} contains no sheets", path.display())]
    NoTables { path: PathBuf },
}

/// Step of a flush, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushStage {
    BackingUp,
    Editing,
    Deleting,
    CounterUpdating,
    ScalarUpdating,
    Persisting,
    Reloading,
}

impl fmt::Display for FlushStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlushStage::BackingUp => "backing up",
            FlushStage::Editing => "opening for edit",
            FlushStage::Deleting => "deleting rows",
            FlushStage::CounterUpdating => "updating squad counters",
            FlushStage::ScalarUpdating => "updating slip values",
            FlushStage::Persisting => "saving",
            FlushStage::Reloading => "reloading",
        };
        f.write_str(name)
    }
}

/// A flush failed before it was committed. Pending edits are left intact.
#[derive(Debug, thiserror::Error)]
#[error("flush failed while {stage}: {source:#}")]
pub struct FlushError {
    pub stage: FlushStage,
    #[source]
    pub source: anyhow::Error,
}

impl FlushError {
    pub fn new(stage: FlushStage, source: anyhow::Error) -> Self {
        Self { stage, source }
    }
}

/// A pick was recorded against a table with no category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("table '{table}' has no category; only player tables can be picked from")]
pub struct InvalidCategoryError {
    pub table: String,
}

/// A squad counter cell did not parse as `picked/limit`; it was counted as 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub category: String,
    pub cell_text: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: could not parse squad counter '{}', treating picked count as 0",
            self.category, self.cell_text
        )
    }
}

/// A user selection could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("search results are from snapshot {batch} but the board is now at {current}; search again")]
    Stale { batch: u64, current: u64 },
    #[error("the board could not be reloaded after the last save; reload before selecting players")]
    SnapshotStale,
    #[error("invalid selection '{0}' (use e.g. 1,3 or 'all' or 'none')")]
    Syntax(String),
}
