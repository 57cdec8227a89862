//! Workbook storage backends.
//!
//! The engine never parses files itself. It asks a [`Storage`] for a snapshot
//! of all sheets, or for an [`EditHandle`] on which it performs structural
//! edits and finally saves. Handles work with 1-based rows and columns, the
//! same way the workbook does; dropping a handle without saving discards every
//! edit made through it.

pub mod memory;
pub mod xlsx;

pub use memory::{FailPoint, MemoryStorage};
pub use xlsx::XlsxStorage;

use crate::table::{CellValue, Table};
use anyhow::Result;
use std::path::Path;

/// Source of workbook snapshots and edit handles.
pub trait Storage {
    type Handle: EditHandle;

    /// Read every sheet of the workbook, in workbook order.
    fn load_tables(&self, path: &Path) -> Result<Vec<Table>>;

    /// Open the workbook for structural edits.
    fn open_for_edit(&self, path: &Path) -> Result<Self::Handle>;

    /// True when `path` names a file on disk, so a sibling `_backup` file can
    /// be restored from or written to.
    fn uses_files(&self) -> bool {
        true
    }
}

/// A workbook opened for editing. Rows and columns are 1-based.
pub trait EditHandle {
    fn table_names(&self) -> Vec<String>;

    fn has_table(&self, table: &str) -> bool {
        self.table_names().iter().any(|t| t == table)
    }

    /// Last row holding any cell, or `None` if the table does not exist.
    fn highest_row(&self, table: &str) -> Option<u32>;

    /// Delete one row, shifting everything below it up by one.
    fn delete_row(&mut self, table: &str, row: u32) -> Result<()>;

    fn get_cell(&self, table: &str, row: u32, col: u32) -> Result<CellValue>;

    fn set_cell(&mut self, table: &str, row: u32, col: u32, value: CellValue) -> Result<()>;

    /// Persist all edits back to the path the handle was opened from.
    fn save(self) -> Result<()>;
}

/// Find the first row whose first cell equals `label`, trimmed and ignoring case.
pub fn find_label_row<H: EditHandle>(handle: &H, table: &str, label: &str) -> Result<Option<u32>> {
    let Some(last) = handle.highest_row(table) else {
        return Ok(None);
    };
    for row in 1..=last {
        let cell = handle.get_cell(table, row, 1)?;
        if cell.display_text().trim().eq_ignore_ascii_case(label.trim()) {
            return Ok(Some(row));
        }
    }
    Ok(None)
}
