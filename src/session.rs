//! A draft session over one workbook.
//!
//! The session owns the snapshot and the pending edits and turns user-level
//! actions (remove these search results, pick that one, change a slip value)
//! into engine calls. Search results are only valid for the snapshot they
//! came from; after any flush the user has to search again.

use crate::backup;
use crate::config::BoardConfig;
use crate::error::{FlushError, InvalidCategoryError, LoadError, SelectionError};
use crate::pending::PendingEditSet;
use crate::reconcile::{self, FlushReport};
use crate::search::{self, MatchBatch, MatchRecord};
use crate::storage::Storage;
use crate::summary::SummaryView;
use crate::stats::{compute_for_category, resolve_stats, ResolvedStats};
use crate::table::{CellValue, TableStore};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Which search results a user chose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    None,
    /// 1-based positions, in the order given
    Positions(Vec<usize>),
}

/// Parse `"1,3"`, `"all"` or `"none"`.
pub fn parse_selection(input: &str) -> Result<Selection, SelectionError> {
    let trimmed = input.trim().to_lowercase();
    match trimmed.as_str() {
        "all" => return Ok(Selection::All),
        "none" | "" => return Ok(Selection::None),
        _ => {}
    }
    let positions = trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| SelectionError::Syntax(input.trim().to_string()))?;
    Ok(Selection::Positions(positions))
}

/// Outcome of a remove or pick action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionOutcome {
    /// Matches that were applied, as `(table, row index)`
    pub applied: Vec<(String, usize)>,
    /// Positions that were out of range
    pub ignored: Vec<usize>,
    /// Present when the action was followed by an automatic flush
    pub flush: Option<FlushReport>,
}

/// Per-category line of the draft summary.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryLine {
    pub category: String,
    pub drafted: String,
    pub slip: String,
    pub stats: ResolvedStats,
}

/// Everything the summary screen shows.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftSummary {
    /// Empty when the workbook has no summary table
    pub categories: Vec<CategoryLine>,
    /// Remaining rows per player table, in workbook order
    pub remaining: Vec<(String, usize)>,
}

impl DraftSummary {
    pub fn build(store: &TableStore, config: &BoardConfig) -> Self {
        let categories = if store.get(&config.summary_table).is_some() {
            let view = SummaryView::from_store(store, config);
            config
                .categories
                .iter()
                .map(|m| {
                    let stored = view.get(&m.category);
                    let stats = resolve_stats(stored, config, || match store.get(&m.table) {
                        Some(table) => {
                            compute_for_category(table, view.threshold_rank(&m.category), config)
                        }
                        None => Default::default(),
                    });
                    let drafted = stored
                        .map(|s| s.my_squad.display_text())
                        .filter(|s| !s.trim().is_empty())
                        .unwrap_or_else(|| "0/0".to_string());
                    let slip = stored
                        .map(|s| s.slip.display_text())
                        .filter(|s| !s.trim().is_empty())
                        .unwrap_or_else(|| "N/A".to_string());
                    CategoryLine {
                        category: m.category.clone(),
                        drafted,
                        slip,
                        stats,
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        let remaining = store
            .tables()
            .iter()
            .filter(|t| !config.is_summary_table(&t.name))
            .map(|t| (t.name.clone(), t.len()))
            .collect();

        Self {
            categories,
            remaining,
        }
    }

    pub fn total_remaining(&self) -> usize {
        self.remaining.iter().map(|(_, n)| n).sum()
    }
}

/// One interactive draft against one workbook path.
pub struct DraftSession<S: Storage> {
    storage: S,
    path: PathBuf,
    config: BoardConfig,
    store: TableStore,
    pending: PendingEditSet,
}

impl<S: Storage> DraftSession<S> {
    /// Restore from backup if configured, then load the workbook.
    ///
    /// The backup policy only applies to storage backed by files. A backup
    /// that cannot be copied is logged and the existing workbook is used.
    pub fn open(storage: S, path: &Path, config: BoardConfig) -> Result<Self, LoadError> {
        if config.backup.restore_on_start && storage.uses_files() {
            if let Err(e) = backup::restore_from_backup(path) {
                log::warn!(
                    "Could not restore {} from backup {}: {} - using existing workbook",
                    path.display(),
                    backup::backup_path(path).display(),
                    e
                );
            }
        }
        let store = TableStore::load(&storage, path)?;
        let pending = PendingEditSet::new(&config);
        Ok(Self {
            storage,
            path: path.to_path_buf(),
            config,
            store,
            pending,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn store(&self) -> &TableStore {
        &self.store
    }

    pub fn pending(&self) -> &PendingEditSet {
        &self.pending
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Player tables in workbook order.
    pub fn player_tables(&self) -> Vec<&str> {
        self.store
            .table_names()
            .into_iter()
            .filter(|t| !self.config.is_summary_table(t))
            .collect()
    }

    pub fn search(&self, query: &str) -> MatchBatch {
        search::search(query, &self.store, &self.config)
    }

    /// Mark selected matches as drafted by someone else.
    pub fn remove(
        &mut self,
        batch: &MatchBatch,
        selection: &Selection,
    ) -> anyhow::Result<ActionOutcome> {
        let (chosen, ignored) = self.resolve(batch, selection)?;
        let mut outcome = ActionOutcome {
            ignored,
            ..ActionOutcome::default()
        };
        for m in chosen {
            self.pending.mark_for_deletion(&m.table, m.row.index);
            log::info!("Marked player from {} for removal", m.table);
            outcome.applied.push((m.table.clone(), m.row.index));
        }
        self.auto_flush(&mut outcome)?;
        Ok(outcome)
    }

    /// Mark selected matches as drafted by the user.
    ///
    /// Every match is checked for a category first; if any is invalid nothing
    /// is recorded.
    pub fn pick(&mut self, batch: &MatchBatch, selection: &Selection) -> anyhow::Result<ActionOutcome> {
        let (chosen, ignored) = self.resolve(batch, selection)?;
        if let Some(bad) = chosen
            .iter()
            .find(|m| self.config.category_for_table(&m.table).is_none())
        {
            return Err(InvalidCategoryError {
                table: bad.table.clone(),
            }
            .into());
        }
        let mut outcome = ActionOutcome {
            ignored,
            ..ActionOutcome::default()
        };
        for m in chosen {
            let category = self.pending.record_pick(&m.table, m.row.index, &self.config)?;
            log::info!("Picked player from {} ({}) for your team", m.table, category);
            outcome.applied.push((m.table.clone(), m.row.index));
        }
        self.auto_flush(&mut outcome)?;
        Ok(outcome)
    }

    /// Set the slip value (threshold rank) of a category.
    pub fn set_slip(&mut self, category: &str, value: CellValue) -> anyhow::Result<Option<FlushReport>> {
        let mapping = self
            .config
            .mapping_for_category(category)
            .or_else(|| {
                self.config
                    .categories
                    .iter()
                    .find(|m| m.category.eq_ignore_ascii_case(category))
            })
            .ok_or_else(|| anyhow::anyhow!("Unknown category '{}'", category))?;
        let category = mapping.category.clone();
        self.pending.set_scalar(&category, value);
        if self.config.auto_flush {
            return Ok(Some(self.flush()?));
        }
        Ok(None)
    }

    /// Apply all pending edits to the workbook.
    pub fn flush(&mut self) -> Result<FlushReport, FlushError> {
        reconcile::flush(
            &self.storage,
            &self.path,
            &self.config,
            &mut self.pending,
            &mut self.store,
        )
    }

    /// Re-read the workbook without touching pending edits. A successful
    /// reload clears a stale snapshot.
    pub fn reload(&mut self) -> Result<(), LoadError> {
        self.store.reload(&self.storage, &self.path)
    }

    pub fn summary(&self) -> DraftSummary {
        DraftSummary::build(&self.store, &self.config)
    }

    /// Matches named by `selection`, each `(table,row)` once, plus the
    /// out-of-range positions.
    fn resolve<'b>(
        &self,
        batch: &'b MatchBatch,
        selection: &Selection,
    ) -> Result<(Vec<&'b MatchRecord>, Vec<usize>), SelectionError> {
        // Row indices of a stale snapshot no longer match the saved file
        if self.store.is_stale() {
            return Err(SelectionError::SnapshotStale);
        }
        if batch.generation != self.store.generation() {
            return Err(SelectionError::Stale {
                batch: batch.generation,
                current: self.store.generation(),
            });
        }
        let positions: Vec<usize> = match selection {
            Selection::All => (1..=batch.len()).collect(),
            Selection::None => Vec::new(),
            Selection::Positions(p) => p.clone(),
        };
        let mut seen = HashSet::new();
        let mut chosen = Vec::new();
        let mut ignored = Vec::new();
        for pos in positions {
            match batch.get(pos) {
                Some(m) => {
                    if seen.insert((m.table.as_str(), m.row.index)) {
                        chosen.push(m);
                    }
                }
                None => ignored.push(pos),
            }
        }
        Ok((chosen, ignored))
    }

    fn auto_flush(&mut self, outcome: &mut ActionOutcome) -> Result<(), FlushError> {
        if self.config.auto_flush && !outcome.applied.is_empty() {
            outcome.flush = Some(self.flush()?);
        }
        Ok(())
    }
}
