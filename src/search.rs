//! Player search across all player tables.

use crate::config::BoardConfig;
use crate::table::{CellValue, RowId, Table, TableStore};

/// One hit: a row of a table whose `column` contains the query.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub table: String,
    pub row: RowId,
    pub column: String,
    /// The whole row at search time, as `(column, value)` pairs
    pub row_data: Vec<(String, CellValue)>,
}

impl MatchRecord {
    /// First text cell of the row, used as a display name.
    pub fn label(&self) -> String {
        self.row_data
            .iter()
            .find(|(_, v)| v.is_text())
            .map(|(_, v)| v.display_text())
            .unwrap_or_default()
    }
}

/// The results of one search, tied to the snapshot they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchBatch {
    pub query: String,
    pub generation: u64,
    pub matches: Vec<MatchRecord>,
}

impl MatchBatch {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Match by 1-based position.
    pub fn get(&self, position: usize) -> Option<&MatchRecord> {
        position.checked_sub(1).and_then(|i| self.matches.get(i))
    }
}

/// Case-insensitive substring search over the text columns of every player
/// table. Results are ordered by table, then row, then column.
pub fn search(query: &str, store: &TableStore, config: &BoardConfig) -> MatchBatch {
    let needle = query.trim().to_lowercase();
    let mut matches = Vec::new();

    if !needle.is_empty() {
        for table in store.tables() {
            if config.is_summary_table(&table.name) || table.is_empty() {
                continue;
            }
            search_table(table, &needle, store.generation(), &mut matches);
        }
    }

    log::debug!("Search '{}' found {} matches", query.trim(), matches.len());
    MatchBatch {
        query: query.trim().to_string(),
        generation: store.generation(),
        matches,
    }
}

fn search_table(table: &Table, needle: &str, generation: u64, out: &mut Vec<MatchRecord>) {
    let text_columns = text_columns(table);
    if text_columns.is_empty() {
        return;
    }
    for (index, row) in table.rows.iter().enumerate() {
        for &col in &text_columns {
            let cell = row.cell(col);
            if cell.is_empty() {
                continue;
            }
            if cell.display_text().to_lowercase().contains(needle) {
                out.push(MatchRecord {
                    table: table.name.clone(),
                    row: RowId { generation, index },
                    column: table.columns[col].clone(),
                    row_data: table.row_pairs(index),
                });
            }
        }
    }
}

/// Columns holding at least one text value. Purely numeric columns are never
/// searched, even if a number's digits would match.
fn text_columns(table: &Table) -> Vec<usize> {
    (0..table.columns.len())
        .filter(|&col| table.rows.iter().any(|r| r.cell(col).is_text()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemorySheet;
    use crate::storage::MemoryStorage;
    use std::path::Path;

    fn store() -> TableStore {
        let storage = MemoryStorage::new();
        storage.insert(
            "b.xlsx",
            vec![
                MemorySheet::new(
                    "QBs",
                    vec![
                        vec!["Player".into(), "Team".into(), "Points".into()],
                        vec!["Josh Allen".into(), "BUF".into(), CellValue::Number(390.0)],
                        vec!["Jalen Hurts".into(), "PHI".into(), CellValue::Number(380.0)],
                    ],
                ),
                MemorySheet::new(
                    "WRs",
                    vec![
                        vec!["Player".into(), "Team".into()],
                        vec!["Keenan Allen".into(), "CHI".into()],
                    ],
                ),
                MemorySheet::new(
                    "Decision Matrix",
                    vec![vec![CellValue::Empty, "QB".into()], vec!["Allen note".into()]],
                ),
            ],
        );
        TableStore::load(&storage, Path::new("b.xlsx")).unwrap()
    }

    #[test]
    fn test_search_orders_by_table_then_row() {
        let config = BoardConfig::default();
        let batch = search("ALLEN", &store(), &config);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.matches[0].table, "QBs");
        assert_eq!(batch.matches[0].row.index, 0);
        assert_eq!(batch.matches[1].table, "WRs");
        assert_eq!(batch.get(2).unwrap().label(), "Keenan Allen");
        assert!(batch.get(0).is_none());
    }

    #[test]
    fn test_numeric_columns_not_searched() {
        let config = BoardConfig::default();
        assert!(search("390", &store(), &config).is_empty());
    }

    #[test]
    fn test_empty_query() {
        let config = BoardConfig::default();
        assert!(search("   ", &store(), &config).is_empty());
    }

    #[test]
    fn test_match_payload() {
        let config = BoardConfig::default();
        let batch = search("phi", &store(), &config);
        assert_eq!(batch.len(), 1);
        let m = &batch.matches[0];
        assert_eq!(m.column, "Team");
        assert_eq!(m.row.index, 1);
        assert_eq!(m.row_data[2], ("Points".to_string(), CellValue::Number(380.0)));
    }
}
