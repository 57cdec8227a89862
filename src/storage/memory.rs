//! In-memory storage backend.
//!
//! Workbooks are plain grids keyed by path. Edits go to a private copy held
//! by the handle and only replace the stored grid on `save`, which gives the
//! same all-or-nothing behaviour as the file backend. Failures can be injected
//! at any step to exercise the flush error paths.

use super::{EditHandle, Storage};
use crate::table::{CellValue, Table};
use anyhow::{anyhow, bail, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A sheet as a grid; `grid[0]` is spreadsheet row 1.
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySheet {
    pub name: String,
    pub grid: Vec<Vec<CellValue>>,
}

impl MemorySheet {
    pub fn new(name: &str, grid: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.to_string(),
            grid,
        }
    }
}

/// Where the next injected failure happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Load,
    Open,
    Delete,
    SetCell,
    Save,
}

#[derive(Debug, Default)]
struct Inner {
    books: BTreeMap<PathBuf, Vec<MemorySheet>>,
    fail: Option<FailPoint>,
    saves: usize,
}

impl Inner {
    fn take_failure(&mut self, point: FailPoint) -> Result<()> {
        if self.fail == Some(point) {
            self.fail = None;
            bail!("injected {:?} failure", point);
        }
        Ok(())
    }
}

/// Storage backed by grids in memory. Clones share the same books.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) a workbook at `path`.
    pub fn insert(&self, path: impl Into<PathBuf>, sheets: Vec<MemorySheet>) {
        self.inner.borrow_mut().books.insert(path.into(), sheets);
    }

    /// Snapshot of the stored sheets at `path`.
    pub fn sheets(&self, path: &Path) -> Option<Vec<MemorySheet>> {
        self.inner.borrow().books.get(path).cloned()
    }

    /// Fail the next operation at `point`, once.
    pub fn fail_next(&self, point: FailPoint) {
        self.inner.borrow_mut().fail = Some(point);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.inner.borrow().saves
    }
}

impl Storage for MemoryStorage {
    type Handle = MemoryHandle;

    fn load_tables(&self, path: &Path) -> Result<Vec<Table>> {
        let mut inner = self.inner.borrow_mut();
        inner.take_failure(FailPoint::Load)?;
        let sheets = inner
            .books
            .get(path)
            .ok_or_else(|| anyhow!("no workbook at {}", path.display()))?;
        Ok(sheets
            .iter()
            .map(|s| Table::from_grid(&s.name, s.grid.clone()))
            .collect())
    }

    fn open_for_edit(&self, path: &Path) -> Result<MemoryHandle> {
        let sheets = {
            let mut inner = self.inner.borrow_mut();
            inner.take_failure(FailPoint::Open)?;
            inner
                .books
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow!("no workbook at {}", path.display()))?
        };
        Ok(MemoryHandle {
            storage: self.clone(),
            path: path.to_path_buf(),
            sheets,
        })
    }

    // Paths only key the in-memory books; nothing on disk belongs to them
    fn uses_files(&self) -> bool {
        false
    }
}

/// Edit handle over a private copy of the sheets.
#[derive(Debug)]
pub struct MemoryHandle {
    storage: MemoryStorage,
    path: PathBuf,
    sheets: Vec<MemorySheet>,
}

impl MemoryHandle {
    fn sheet(&self, table: &str) -> Result<&MemorySheet> {
        self.sheets
            .iter()
            .find(|s| s.name == table)
            .ok_or_else(|| anyhow!("sheet '{}' not found", table))
    }

    fn sheet_mut(&mut self, table: &str) -> Result<&mut MemorySheet> {
        self.sheets
            .iter_mut()
            .find(|s| s.name == table)
            .ok_or_else(|| anyhow!("sheet '{}' not found", table))
    }
}

impl EditHandle for MemoryHandle {
    fn table_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn highest_row(&self, table: &str) -> Option<u32> {
        self.sheets
            .iter()
            .find(|s| s.name == table)
            .map(|s| s.grid.len() as u32)
    }

    fn delete_row(&mut self, table: &str, row: u32) -> Result<()> {
        self.storage
            .inner
            .borrow_mut()
            .take_failure(FailPoint::Delete)?;
        if row == 0 {
            bail!("row numbers start at 1");
        }
        let sheet = self.sheet_mut(table)?;
        let idx = (row - 1) as usize;
        if idx < sheet.grid.len() {
            sheet.grid.remove(idx);
        }
        Ok(())
    }

    fn get_cell(&self, table: &str, row: u32, col: u32) -> Result<CellValue> {
        if row == 0 || col == 0 {
            bail!("rows and columns start at 1");
        }
        let sheet = self.sheet(table)?;
        Ok(sheet
            .grid
            .get((row - 1) as usize)
            .and_then(|r| r.get((col - 1) as usize))
            .cloned()
            .unwrap_or(CellValue::Empty))
    }

    fn set_cell(&mut self, table: &str, row: u32, col: u32, value: CellValue) -> Result<()> {
        self.storage
            .inner
            .borrow_mut()
            .take_failure(FailPoint::SetCell)?;
        if row == 0 || col == 0 {
            bail!("rows and columns start at 1");
        }
        let sheet = self.sheet_mut(table)?;
        let (r, c) = ((row - 1) as usize, (col - 1) as usize);
        if sheet.grid.len() <= r {
            sheet.grid.resize(r + 1, Vec::new());
        }
        let cells = &mut sheet.grid[r];
        if cells.len() <= c {
            cells.resize(c + 1, CellValue::Empty);
        }
        cells[c] = value;
        Ok(())
    }

    fn save(self) -> Result<()> {
        let mut inner = self.storage.inner.borrow_mut();
        inner.take_failure(FailPoint::Save)?;
        inner.books.insert(self.path, self.sheets);
        inner.saves += 1;
        Ok(())
    }
}
