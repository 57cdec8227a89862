//! In-memory snapshot of the workbook.
//!
//! A [`TableStore`] is rebuilt wholesale from storage; it is never patched in
//! place. Each rebuild gets a new generation number so that row identities
//! handed out by one snapshot can be recognised as stale after a reload.

use crate::error::LoadError;
use crate::storage::Storage;
use std::fmt;
use std::path::{Path, PathBuf};

/// A single scalar cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, CellValue::Text(s) if !s.trim().is_empty())
    }

    /// Numeric view: numbers as-is, text if it parses as a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Text as a spreadsheet would display it; empty cells become "".
    pub fn display_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

/// Identity of a row within one snapshot generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId {
    pub generation: u64,
    /// Zero-based position at load time
    pub index: usize,
}

/// One data row; cells line up with the owning table's columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub cells: Vec<CellValue>,
}

impl Row {
    pub fn cell(&self, col: usize) -> &CellValue {
        self.cells.get(col).unwrap_or(&CellValue::Empty)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(CellValue::is_empty)
    }
}

/// A named sheet: header row as column names plus data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Build a table from a raw grid whose first row is the header.
    ///
    /// Trailing blank rows are dropped; blank rows in the middle are kept so a
    /// row's index still maps to its persisted position.
    pub fn from_grid(name: &str, mut grid: Vec<Vec<CellValue>>) -> Self {
        if grid.is_empty() {
            return Self {
                name: name.to_string(),
                columns: Vec::new(),
                rows: Vec::new(),
            };
        }
        let header = grid.remove(0);
        let width = grid
            .iter()
            .map(|r| r.len())
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or(0);

        let columns: Vec<String> = (0..width)
            .map(|i| match header.get(i) {
                Some(v) if !v.is_empty() => v.display_text().trim().to_string(),
                _ => format!("Unnamed: {}", i),
            })
            .collect();

        let mut rows: Vec<Row> = grid
            .into_iter()
            .map(|mut cells| {
                cells.resize(width, CellValue::Empty);
                Row { cells }
            })
            .collect();
        while rows.last().is_some_and(Row::is_blank) {
            rows.pop();
        }

        Self {
            name: name.to_string(),
            columns,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Cell by row index and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| r.cell(col))
    }

    /// Row as `(column, value)` pairs.
    pub fn row_pairs(&self, row: usize) -> Vec<(String, CellValue)> {
        match self.rows.get(row) {
            Some(r) => self
                .columns
                .iter()
                .cloned()
                .zip(r.cells.iter().cloned())
                .collect(),
            None => Vec::new(),
        }
    }
}

/// The canonical read-side snapshot of the workbook.
#[derive(Debug, Clone)]
pub struct TableStore {
    path: PathBuf,
    tables: Vec<Table>,
    generation: u64,
    stale: bool,
}

impl TableStore {
    /// Load all tables from `path`.
    pub fn load<S: Storage>(storage: &S, path: &Path) -> Result<Self, LoadError> {
        let tables = load_tables(storage, path)?;
        Ok(Self {
            path: path.to_path_buf(),
            tables,
            generation: 1,
            stale: false,
        })
    }

    /// Re-read the workbook and swap in the new tables. On failure the old
    /// snapshot is kept and marked stale, and the generation still moves on so
    /// row identities handed out before the attempt no longer resolve.
    pub fn reload<S: Storage>(&mut self, storage: &S, path: &Path) -> Result<(), LoadError> {
        match load_tables(storage, path) {
            Ok(tables) => {
                self.tables = tables;
                self.path = path.to_path_buf();
                self.generation += 1;
                self.stale = false;
                log::debug!("Reloaded {} (generation {})", path.display(), self.generation);
                Ok(())
            }
            Err(e) => {
                self.generation += 1;
                self.stale = true;
                Err(e)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True when a committed flush could not be followed by a reload.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Tables in workbook order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn row_id(&self, index: usize) -> RowId {
        RowId {
            generation: self.generation,
            index,
        }
    }
}

fn load_tables<S: Storage>(storage: &S, path: &Path) -> Result<Vec<Table>, LoadError> {
    let tables = storage
        .load_tables(path)
        .map_err(|source| LoadError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
    if tables.is_empty() {
        return Err(LoadError::NoTables {
            path: path.to_path_buf(),
        });
    }
    for table in &tables {
        log::info!(
            "Loaded {}: {} rows, {} columns",
            table.name,
            table.len(),
            table.columns.len()
        );
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_from_grid_header_and_rows() {
        let table = Table::from_grid(
            "QBs",
            vec![
                vec![text("Player"), text("Points")],
                vec![text("Allen"), CellValue::Number(390.0)],
                vec![text("Hurts")],
            ],
        );
        assert_eq!(table.columns, vec!["Player", "Points"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1].cell(1), &CellValue::Empty);
        assert_eq!(table.value(0, "Points"), Some(&CellValue::Number(390.0)));
    }

    #[test]
    fn test_from_grid_keeps_inner_blank_rows() {
        let table = Table::from_grid(
            "RBs",
            vec![
                vec![text("Player")],
                vec![text("A")],
                vec![CellValue::Empty],
                vec![text("B")],
                vec![CellValue::Empty],
                vec![text("  ")],
            ],
        );
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[2].cell(0), &text("B"));
    }

    #[test]
    fn test_unnamed_columns() {
        let table = Table::from_grid(
            "Decision Matrix",
            vec![vec![CellValue::Empty, text("QB")], vec![text("My squad"), text("0/2")]],
        );
        assert_eq!(table.columns, vec!["Unnamed: 0", "QB"]);
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Number(3.0).to_string(), "3");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Empty.to_string(), "");
        assert_eq!(text(" 12.5 ").as_f64(), Some(12.5));
        assert!(!CellValue::Number(1.0).is_text());
    }
}
