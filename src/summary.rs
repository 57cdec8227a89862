//! The summary sheet ("Decision Matrix").
//!
//! Rows are found by their label in the first column; categories by their
//! configured column. The `my squad` row holds `picked/limit` counters.

use crate::config::BoardConfig;
use crate::table::{CellValue, Table, TableStore};
use std::collections::BTreeMap;

/// A parsed `picked/limit` counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquadCounter {
    pub picked: i64,
    /// Right-hand side, kept verbatim
    pub limit: String,
    /// False when the picked side had to be assumed to be 0
    pub parsed: bool,
}

impl SquadCounter {
    /// Add `delta` to the picked side; the limit is never touched.
    pub fn apply(&self, delta: i64) -> String {
        format_counter(self.picked.saturating_add(delta), &self.limit)
    }
}

/// Parse a squad counter cell.
///
/// Only `X/Y` with an integer `X` parses. Anything else counts as `0/Y` and
/// is flagged; without a `/` the limit is `0`.
pub fn parse_counter(text: &str) -> SquadCounter {
    let trimmed = text.trim();
    let (left, limit) = match trimmed.split_once('/') {
        Some((l, r)) => (l.trim(), r.trim().to_string()),
        None => (trimmed, "0".to_string()),
    };
    match left.parse::<i64>() {
        Ok(picked) if trimmed.contains('/') => SquadCounter {
            picked,
            limit,
            parsed: true,
        },
        _ => SquadCounter {
            picked: 0,
            limit,
            parsed: false,
        },
    }
}

pub fn format_counter(picked: i64, limit: &str) -> String {
    format!("{}/{}", picked, limit)
}

/// Index of the first row of `table` whose first cell matches `label`.
pub fn label_row(table: &Table, label: &str) -> Option<usize> {
    let wanted = label.trim();
    table.rows.iter().position(|row| {
        row.cell(0)
            .display_text()
            .trim()
            .eq_ignore_ascii_case(wanted)
    })
}

/// One category's column of the summary sheet, as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub my_squad: CellValue,
    pub slip: CellValue,
    pub top_player: CellValue,
    pub lower_player: CellValue,
    pub diff: CellValue,
}

impl Default for CategorySummary {
    fn default() -> Self {
        Self {
            my_squad: CellValue::Empty,
            slip: CellValue::Empty,
            top_player: CellValue::Empty,
            lower_player: CellValue::Empty,
            diff: CellValue::Empty,
        }
    }
}

/// Stored contents of the summary sheet, keyed by category.
#[derive(Debug, Clone, Default)]
pub struct SummaryView {
    pub categories: BTreeMap<String, CategorySummary>,
}

impl SummaryView {
    /// Read the summary table from a snapshot. Missing table, rows or columns
    /// simply leave the corresponding cells empty.
    pub fn from_store(store: &TableStore, config: &BoardConfig) -> Self {
        match store.get(&config.summary_table) {
            Some(table) => Self::from_table(table, config),
            None => Self::default(),
        }
    }

    pub fn from_table(table: &Table, config: &BoardConfig) -> Self {
        let labels = &config.labels;
        let lookup = |label: &str, column: u32| -> CellValue {
            // Snapshot columns are zero-based; A is the label column
            let col = column.saturating_sub(1) as usize;
            label_row(table, label)
                .map(|r| table.rows[r].cell(col).clone())
                .unwrap_or(CellValue::Empty)
        };

        let categories = config
            .categories
            .iter()
            .map(|m| {
                let c = m.summary_column;
                (
                    m.category.clone(),
                    CategorySummary {
                        my_squad: lookup(&labels.my_squad, c),
                        slip: lookup(&labels.slip, c),
                        top_player: lookup(&labels.top_player, c),
                        lower_player: lookup(&labels.lower_player, c),
                        diff: lookup(&labels.diff, c),
                    },
                )
            })
            .collect();
        Self { categories }
    }

    pub fn get(&self, category: &str) -> Option<&CategorySummary> {
        self.categories.get(category)
    }

    /// Threshold rank from the `slip` row: positive whole part, else `None`.
    pub fn threshold_rank(&self, category: &str) -> Option<usize> {
        let slip = &self.get(category)?.slip;
        let value = slip.as_f64()?;
        if !value.is_finite() || value < 1.0 {
            return None;
        }
        Some(value.trunc() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_counter() {
        let c = parse_counter("3/10");
        assert_eq!(c.picked, 3);
        assert_eq!(c.limit, "10");
        assert!(c.parsed);
        assert_eq!(c.apply(2), "5/10");

        let c = parse_counter(" 1 / 2 ");
        assert_eq!(c.apply(1), "2/2");
    }

    #[test]
    fn test_parse_counter_unparseable() {
        let c = parse_counter("");
        assert!(!c.parsed);
        assert_eq!(c.apply(1), "1/0");

        let c = parse_counter("abc/4");
        assert!(!c.parsed);
        assert_eq!(c.apply(1), "1/4");

        let c = parse_counter("2");
        assert!(!c.parsed);
        assert_eq!(c.apply(1), "1/0");

        let c = parse_counter("2.0/4");
        assert!(!c.parsed);
        assert_eq!(c.apply(1), "1/4");
    }

    #[test]
    fn test_counter_apply_saturates() {
        let c = parse_counter("9223372036854775807/10");
        assert!(c.parsed);
        assert_eq!(c.apply(1), "9223372036854775807/10");
    }

    #[test]
    fn test_label_row_trimmed_case_insensitive() {
        let table = Table::from_grid(
            "Decision Matrix",
            vec![
                vec![CellValue::Empty, "QB".into()],
                vec!["  My Squad ".into(), "1/2".into()],
                vec!["SLIP".into(), CellValue::Number(3.0)],
            ],
        );
        assert_eq!(label_row(&table, "my squad"), Some(0));
        assert_eq!(label_row(&table, "slip"), Some(1));
        assert_eq!(label_row(&table, "diff"), None);
    }

    #[test]
    fn test_threshold_rank() {
        let config = BoardConfig::default();
        let table = Table::from_grid(
            "Decision Matrix",
            vec![
                vec![CellValue::Empty, "QB".into(), "RB".into(), "WR".into(), "K".into()],
                vec![
                    "Slip".into(),
                    CellValue::Number(3.0),
                    "2.7".into(),
                    "n/a".into(),
                    CellValue::Number(0.0),
                ],
            ],
        );
        let view = SummaryView::from_table(&table, &config);
        assert_eq!(view.threshold_rank("QB"), Some(3));
        assert_eq!(view.threshold_rank("RB"), Some(2));
        assert_eq!(view.threshold_rank("WR"), None);
        assert_eq!(view.threshold_rank("K"), None);
        assert_eq!(view.threshold_rank("TE"), None);
    }
}
