//! Edits waiting for the next flush.

use crate::config::BoardConfig;
use crate::error::InvalidCategoryError;
use crate::table::CellValue;
use std::collections::{BTreeMap, BTreeSet};

/// Uncommitted edits against the persisted workbook.
///
/// Deletions are stored as persisted positions (1-based, header included), so
/// they stay meaningful to the writer regardless of what happens to the
/// in-memory snapshot before the flush.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEditSet {
    deletions: BTreeMap<String, BTreeSet<u32>>,
    counter_deltas: BTreeMap<String, i64>,
    scalar_overwrites: BTreeMap<String, CellValue>,
    header_offset: u32,
}

impl Default for PendingEditSet {
    fn default() -> Self {
        Self::new(&BoardConfig::default())
    }
}

impl PendingEditSet {
    pub fn new(config: &BoardConfig) -> Self {
        Self {
            deletions: BTreeMap::new(),
            counter_deltas: BTreeMap::new(),
            scalar_overwrites: BTreeMap::new(),
            header_offset: config.header_offset,
        }
    }

    /// Persisted position for a zero-based row index.
    pub fn persisted_position(&self, row_index: usize) -> u32 {
        row_index as u32 + self.header_offset
    }

    /// Mark a row for deletion. Returns false if it was already marked.
    pub fn mark_for_deletion(&mut self, table: &str, row_index: usize) -> bool {
        let position = self.persisted_position(row_index);
        let inserted = self
            .deletions
            .entry(table.to_string())
            .or_default()
            .insert(position);
        log::debug!("Marked {} row {} for deletion", table, position);
        inserted
    }

    /// Mark a row for deletion and count it towards the table's category.
    ///
    /// Tables without a category are rejected before anything is recorded.
    pub fn record_pick(
        &mut self,
        table: &str,
        row_index: usize,
        config: &BoardConfig,
    ) -> Result<String, InvalidCategoryError> {
        let category = config
            .category_for_table(table)
            .map(|m| m.category.clone())
            .ok_or_else(|| InvalidCategoryError {
                table: table.to_string(),
            })?;
        self.mark_for_deletion(table, row_index);
        *self.counter_deltas.entry(category.clone()).or_insert(0) += 1;
        Ok(category)
    }

    /// Overwrite a summary scalar; the last value set before a flush wins.
    pub fn set_scalar(&mut self, category: &str, value: CellValue) {
        self.scalar_overwrites.insert(category.to_string(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.deletions.values().all(BTreeSet::is_empty)
            && self.counter_deltas.is_empty()
            && self.scalar_overwrites.is_empty()
    }

    pub fn clear(&mut self) {
        self.deletions.clear();
        self.counter_deltas.clear();
        self.scalar_overwrites.clear();
    }

    pub fn deletions(&self) -> &BTreeMap<String, BTreeSet<u32>> {
        &self.deletions
    }

    pub fn counter_deltas(&self) -> &BTreeMap<String, i64> {
        &self.counter_deltas
    }

    pub fn scalar_overwrites(&self) -> &BTreeMap<String, CellValue> {
        &self.scalar_overwrites
    }

    pub fn deletion_count(&self) -> usize {
        self.deletions.values().map(BTreeSet::len).sum()
    }

    /// Positions to delete from `table`, highest first.
    pub fn deletions_descending(&self, table: &str) -> Vec<u32> {
        self.deletions
            .get(table)
            .map(|set| set.iter().rev().copied().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_is_idempotent() {
        let config = BoardConfig::default();
        let mut pending = PendingEditSet::new(&config);
        assert!(pending.mark_for_deletion("QBs", 3));
        assert!(!pending.mark_for_deletion("QBs", 3));
        assert_eq!(pending.deletion_count(), 1);
        assert_eq!(pending.deletions()["QBs"].iter().next(), Some(&5));
    }

    #[test]
    fn test_record_pick_counts_category() {
        let config = BoardConfig::default();
        let mut pending = PendingEditSet::new(&config);
        assert_eq!(pending.record_pick("RBs", 0, &config).unwrap(), "RB");
        pending.record_pick("RBs", 4, &config).unwrap();
        assert_eq!(pending.counter_deltas()["RB"], 2);
        assert_eq!(pending.deletions_descending("RBs"), vec![6, 2]);
    }

    #[test]
    fn test_record_pick_rejects_summary_table() {
        let config = BoardConfig::default();
        let mut pending = PendingEditSet::new(&config);
        let err = pending
            .record_pick("Decision Matrix", 0, &config)
            .unwrap_err();
        assert_eq!(err.table, "Decision Matrix");
        assert!(pending.is_empty());
    }

    #[test]
    fn test_set_scalar_last_write_wins_and_clear() {
        let config = BoardConfig::default();
        let mut pending = PendingEditSet::new(&config);
        pending.set_scalar("QB", CellValue::Number(3.0));
        pending.set_scalar("QB", CellValue::Number(5.0));
        assert_eq!(pending.scalar_overwrites()["QB"], CellValue::Number(5.0));
        assert!(!pending.is_empty());
        pending.clear();
        assert!(pending.is_empty());
    }
}
