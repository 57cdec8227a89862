//! Applying pending edits to the persisted workbook.
//!
//! A flush runs as a fixed sequence of stages against one edit handle:
//! delete rows, update squad counters, overwrite slip values, save, reload.
//! Nothing reaches the file before the save, so a failure in any earlier stage
//! leaves both the workbook and the pending edits exactly as they were. Once
//! the save succeeds the flush is committed, even if the reload that follows
//! fails.

use crate::backup;
use crate::config::BoardConfig;
use crate::error::{FlushError, FlushStage, ParseWarning};
use crate::pending::PendingEditSet;
use crate::storage::{find_label_row, EditHandle, Storage};
use crate::summary::parse_counter;
use crate::table::{CellValue, TableStore};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

/// A squad counter cell before and after the flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterUpdate {
    pub category: String,
    pub before: String,
    pub after: String,
}

/// A slip cell before and after the flush.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarUpdate {
    pub category: String,
    pub before: CellValue,
    pub after: CellValue,
}

/// What a flush did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushReport {
    /// Deleted persisted positions per table, in deletion order
    pub deleted: BTreeMap<String, Vec<u32>>,
    /// Deletions that matched no row (missing table or past the last row)
    pub skipped_deletions: Vec<(String, u32)>,
    pub counter_updates: Vec<CounterUpdate>,
    /// Counter deltas that had nowhere to go
    pub dropped_deltas: BTreeMap<String, i64>,
    pub scalar_updates: Vec<ScalarUpdate>,
    pub dropped_scalars: Vec<String>,
    pub warnings: Vec<ParseWarning>,
    /// The workbook on disk was rewritten
    pub committed: bool,
    /// Set when the save succeeded but reloading the snapshot failed
    pub reload_error: Option<String>,
}

impl FlushReport {
    pub fn rows_deleted(&self) -> usize {
        self.deleted.values().map(Vec::len).sum()
    }

    /// Human-readable account of the flush, one line per change.
    pub fn describe(&self) -> String {
        if !self.committed {
            return "No changes to save".to_string();
        }
        let mut out = String::new();
        for (table, rows) in &self.deleted {
            for row in rows {
                let _ = writeln!(out, "Deleted row {} from {}", row, table);
            }
        }
        for (table, row) in &self.skipped_deletions {
            let _ = writeln!(out, "Skipped row {} of {} (no such row)", row, table);
        }
        for u in &self.counter_updates {
            let _ = writeln!(out, "Updated {}: {} -> {}", u.category, u.before, u.after);
        }
        for (category, delta) in &self.dropped_deltas {
            let _ = writeln!(out, "Could not record {:+} pick(s) for {}", delta, category);
        }
        for u in &self.scalar_updates {
            let _ = writeln!(out, "Updated {} slip: {} -> {}", u.category, u.before, u.after);
        }
        for category in &self.dropped_scalars {
            let _ = writeln!(out, "Could not update {} slip", category);
        }
        for w in &self.warnings {
            let _ = writeln!(out, "Warning: {}", w);
        }
        if let Some(e) = &self.reload_error {
            let _ = writeln!(out, "Saved, but reloading failed: {}", e);
        }
        out.push_str("Workbook updated");
        out
    }
}

/// Apply `pending` to the workbook at `path` and refresh `store`.
///
/// On error nothing has been written and `pending` is unchanged. On success
/// `pending` is empty and `store` reflects the saved workbook (unless the
/// report carries a `reload_error`, in which case the store is marked stale).
pub fn flush<S: Storage>(
    storage: &S,
    path: &Path,
    config: &BoardConfig,
    pending: &mut PendingEditSet,
    store: &mut TableStore,
) -> Result<FlushReport, FlushError> {
    let mut report = FlushReport::default();
    if pending.is_empty() {
        log::debug!("Flush requested with no pending edits");
        return Ok(report);
    }

    if config.backup.backup_on_write && storage.uses_files() {
        backup::write_backup(path).map_err(|e| FlushError::new(FlushStage::BackingUp, e))?;
    }

    let mut handle = storage
        .open_for_edit(path)
        .map_err(|e| FlushError::new(FlushStage::Editing, e))?;

    delete_rows(&mut handle, pending, &mut report)
        .map_err(|e| FlushError::new(FlushStage::Deleting, e))?;
    update_counters(&mut handle, pending, config, &mut report)
        .map_err(|e| FlushError::new(FlushStage::CounterUpdating, e))?;
    update_scalars(&mut handle, pending, config, &mut report)
        .map_err(|e| FlushError::new(FlushStage::ScalarUpdating, e))?;

    handle
        .save()
        .map_err(|e| FlushError::new(FlushStage::Persisting, e))?;
    report.committed = true;
    log::info!(
        "Saved {}: {} rows deleted, {} counters and {} slip values updated",
        path.display(),
        report.rows_deleted(),
        report.counter_updates.len(),
        report.scalar_updates.len()
    );

    if let Err(e) = store.reload(storage, path) {
        log::warn!("Workbook saved but {} failed: {}", FlushStage::Reloading, e);
        report.reload_error = Some(e.to_string());
    }
    pending.clear();
    Ok(report)
}

/// Delete marked rows, highest position first so earlier deletions never
/// shift the rows still waiting to be deleted.
fn delete_rows<H: EditHandle>(
    handle: &mut H,
    pending: &PendingEditSet,
    report: &mut FlushReport,
) -> anyhow::Result<()> {
    for table in pending.deletions().keys() {
        let positions = pending.deletions_descending(table);
        let Some(last) = handle.highest_row(table) else {
            log::warn!("Sheet '{}' not in workbook; skipping {} deletions", table, positions.len());
            report
                .skipped_deletions
                .extend(positions.into_iter().map(|p| (table.clone(), p)));
            continue;
        };
        for position in positions {
            if position > last {
                log::warn!("{} row {} does not exist; skipping", table, position);
                report.skipped_deletions.push((table.clone(), position));
                continue;
            }
            handle.delete_row(table, position)?;
            log::debug!("Deleted row {} from {}", position, table);
            report
                .deleted
                .entry(table.clone())
                .or_default()
                .push(position);
        }
    }
    Ok(())
}

fn update_counters<H: EditHandle>(
    handle: &mut H,
    pending: &PendingEditSet,
    config: &BoardConfig,
    report: &mut FlushReport,
) -> anyhow::Result<()> {
    let deltas = pending.counter_deltas();
    if deltas.is_empty() {
        return Ok(());
    }
    let summary = &config.summary_table;
    let row = if handle.has_table(summary) {
        find_label_row(handle, summary, &config.labels.my_squad)?
    } else {
        None
    };
    let Some(row) = row else {
        log::warn!(
            "No '{}' row in '{}'; dropping squad updates {:?}",
            config.labels.my_squad,
            summary,
            deltas
        );
        report.dropped_deltas.extend(deltas.clone());
        return Ok(());
    };

    for (category, delta) in deltas {
        let Some(mapping) = config.mapping_for_category(category) else {
            log::warn!("No summary column for category {}; dropping {:+}", category, delta);
            report.dropped_deltas.insert(category.clone(), *delta);
            continue;
        };
        let col = mapping.summary_column;
        let before = handle.get_cell(summary, row, col)?.display_text();
        let counter = parse_counter(&before);
        if !counter.parsed {
            let warning = ParseWarning {
                category: category.clone(),
                cell_text: before.clone(),
            };
            log::warn!("{}", warning);
            report.warnings.push(warning);
        }
        let after = counter.apply(*delta);
        handle.set_cell(summary, row, col, CellValue::Text(after.clone()))?;
        log::debug!("Updated {}: {} -> {}", category, before, after);
        report.counter_updates.push(CounterUpdate {
            category: category.clone(),
            before,
            after,
        });
    }
    Ok(())
}

fn update_scalars<H: EditHandle>(
    handle: &mut H,
    pending: &PendingEditSet,
    config: &BoardConfig,
    report: &mut FlushReport,
) -> anyhow::Result<()> {
    let overwrites = pending.scalar_overwrites();
    if overwrites.is_empty() {
        return Ok(());
    }
    let summary = &config.summary_table;
    let row = if handle.has_table(summary) {
        find_label_row(handle, summary, &config.labels.slip)?
    } else {
        None
    };
    let Some(row) = row else {
        log::warn!(
            "No '{}' row in '{}'; dropping slip updates",
            config.labels.slip,
            summary
        );
        report.dropped_scalars.extend(overwrites.keys().cloned());
        return Ok(());
    };

    for (category, value) in overwrites {
        let Some(mapping) = config.mapping_for_category(category) else {
            log::warn!("No summary column for category {}; dropping slip", category);
            report.dropped_scalars.push(category.clone());
            continue;
        };
        let col = mapping.summary_column;
        let before = handle.get_cell(summary, row, col)?;
        handle.set_cell(summary, row, col, value.clone())?;
        report.scalar_updates.push(ScalarUpdate {
            category: category.clone(),
            before,
            after: value.clone(),
        });
    }
    Ok(())
}
