//! `.xlsx` backend built on umya-spreadsheet.
//!
//! umya keeps formulas, styles and everything else it does not understand, so
//! structural edits made here leave the summary sheet's formulas in place.
//! Saves go to a temporary file next to the target and are renamed over it,
//! so a failed write never truncates the workbook.

use super::{EditHandle, Storage};
use crate::table::{CellValue, Table};
use anyhow::{anyhow, bail, Context, Result};
use std::path::{Path, PathBuf};
use umya_spreadsheet::{reader::xlsx, CellRawValue, Spreadsheet, Worksheet};

/// Reads and edits `.xlsx` workbooks on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxStorage;

impl XlsxStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Storage for XlsxStorage {
    type Handle = XlsxHandle;

    fn load_tables(&self, path: &Path) -> Result<Vec<Table>> {
        let book = read_book(path)?;
        Ok(book
            .get_sheet_collection()
            .iter()
            .map(|ws| Table::from_grid(ws.get_name(), sheet_grid(ws)))
            .collect())
    }

    fn open_for_edit(&self, path: &Path) -> Result<XlsxHandle> {
        Ok(XlsxHandle {
            book: read_book(path)?,
            path: path.to_path_buf(),
        })
    }
}

/// An open workbook. Edits stay in memory until [`EditHandle::save`].
pub struct XlsxHandle {
    book: Spreadsheet,
    path: PathBuf,
}

impl XlsxHandle {
    fn sheet(&self, table: &str) -> Result<&Worksheet> {
        self.book
            .get_sheet_by_name(table)
            .ok_or_else(|| anyhow!("sheet '{}' not found", table))
    }

    fn sheet_mut(&mut self, table: &str) -> Result<&mut Worksheet> {
        self.book
            .get_sheet_by_name_mut(table)
            .ok_or_else(|| anyhow!("sheet '{}' not found", table))
    }
}

impl EditHandle for XlsxHandle {
    fn table_names(&self) -> Vec<String> {
        self.book
            .get_sheet_collection()
            .iter()
            .map(|ws| ws.get_name().to_string())
            .collect()
    }

    fn highest_row(&self, table: &str) -> Option<u32> {
        self.book
            .get_sheet_by_name(table)
            .map(|ws| ws.get_highest_row())
    }

    fn delete_row(&mut self, table: &str, row: u32) -> Result<()> {
        if row == 0 {
            bail!("row numbers start at 1");
        }
        let ws = self.sheet_mut(table)?;
        ws.remove_row(&row, &1);
        Ok(())
    }

    fn get_cell(&self, table: &str, row: u32, col: u32) -> Result<CellValue> {
        if row == 0 || col == 0 {
            bail!("rows and columns start at 1");
        }
        let ws = self.sheet(table)?;
        Ok(ws
            .get_cell((col, row))
            .map(|cell| convert_raw(cell.get_cell_value().get_raw_value(), &cell.get_value()))
            .unwrap_or(CellValue::Empty))
    }

    fn set_cell(&mut self, table: &str, row: u32, col: u32, value: CellValue) -> Result<()> {
        if row == 0 || col == 0 {
            bail!("rows and columns start at 1");
        }
        let ws = self.sheet_mut(table)?;
        // umya addresses cells as (col, row)
        let cell = ws.get_cell_mut((col, row));
        match value {
            CellValue::Text(s) => {
                cell.set_value(s);
            }
            CellValue::Number(n) => {
                cell.set_value_number(n);
            }
            CellValue::Bool(b) => {
                cell.set_value_bool(b);
            }
            CellValue::Empty => {
                cell.set_blank();
            }
        }
        Ok(())
    }

    fn save(self) -> Result<()> {
        write_atomic(&self.book, &self.path)
    }
}

fn read_book(path: &Path) -> Result<Spreadsheet> {
    // Full (non-lazy) read so every sheet is deserialized before we touch it
    xlsx::read(path).with_context(|| format!("Failed to open workbook {}", path.display()))
}

/// Write to a sibling temp file, then rename it over `path`.
fn write_atomic(book: &Spreadsheet, path: &Path) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let tmp = tempfile::Builder::new()
        .prefix(".draft-board-")
        .suffix(".xlsx")
        .tempfile_in(dir)
        .context("Failed to create temporary file for save")?;
    umya_spreadsheet::writer::xlsx::write(book, tmp.path())
        .with_context(|| format!("Failed to write workbook to {}", tmp.path().display()))?;
    tmp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// All cells of a sheet as a grid starting at A1.
fn sheet_grid(ws: &Worksheet) -> Vec<Vec<CellValue>> {
    let rows = ws.get_highest_row() as usize;
    let cols = ws.get_highest_column() as usize;
    let mut grid = vec![vec![CellValue::Empty; cols]; rows];
    for cell in ws.get_cell_collection() {
        let coord = cell.get_coordinate();
        let col = *coord.get_col_num() as usize;
        let row = *coord.get_row_num() as usize;
        if row == 0 || col == 0 || row > rows || col > cols {
            continue;
        }
        grid[row - 1][col - 1] = convert_raw(cell.get_cell_value().get_raw_value(), &cell.get_value());
    }
    grid
}

/// Convert a stored value. Formula cells yield their cached result.
fn convert_raw(raw: &CellRawValue, shown: &str) -> CellValue {
    match raw {
        CellRawValue::Numeric(n) => CellValue::Number(*n),
        CellRawValue::Bool(b) => CellValue::Bool(*b),
        CellRawValue::String(s) => CellValue::Text(s.to_string()),
        CellRawValue::RichText(rt) => CellValue::Text(rt.get_text().to_string()),
        CellRawValue::Lazy(s) => {
            let txt: &str = s.as_ref();
            if let Ok(n) = txt.parse::<f64>() {
                CellValue::Number(n)
            } else if txt.eq_ignore_ascii_case("TRUE") {
                CellValue::Bool(true)
            } else if txt.eq_ignore_ascii_case("FALSE") {
                CellValue::Bool(false)
            } else if txt.is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(txt.to_string())
            }
        }
        CellRawValue::Error(_) => CellValue::Text(shown.to_string()),
        CellRawValue::Empty => CellValue::Empty,
    }
}
