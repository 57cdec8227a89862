//! Derived ranking statistics per category.
//!
//! The summary sheet normally carries top / lower / diff values computed by
//! its own formulas. When those are missing or placeholders, the same numbers
//! are computed here from the player table. [`resolve_stats`] is the single
//! place that decides which source wins.

use crate::config::BoardConfig;
use crate::summary::CategorySummary;
use crate::table::{CellValue, Table};

/// Top value, value at the threshold rank, and their difference.
/// `None` means "not available".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CategoryStats {
    pub top: Option<f64>,
    pub threshold: Option<f64>,
    pub diff: Option<f64>,
}

impl CategoryStats {
    pub fn not_available() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsSource {
    Stored,
    Computed,
}

/// Stats together with where they came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedStats {
    pub stats: CategoryStats,
    pub source: StatsSource,
}

/// First column whose name contains one of the configured synonyms.
pub fn detect_value_column(table: &Table, config: &BoardConfig) -> Option<usize> {
    table.columns.iter().position(|name| {
        let lower = name.to_lowercase();
        config
            .value_column_synonyms
            .iter()
            .any(|syn| lower.contains(&syn.to_lowercase()))
    })
}

/// Rank the table's rows by value and read off top and threshold values.
pub fn compute_for_category(
    table: &Table,
    threshold_rank: Option<usize>,
    config: &BoardConfig,
) -> CategoryStats {
    let Some(col) = detect_value_column(table, config) else {
        log::debug!("{}: no value column found", table.name);
        return CategoryStats::not_available();
    };

    let mut values: Vec<f64> = table
        .rows
        .iter()
        .filter_map(|r| r.cell(col).as_f64())
        .filter(|v| v.is_finite())
        .collect();
    // Stable sort keeps original order among equal values
    values.sort_by(|a, b| b.total_cmp(a));

    let top = values.first().copied();
    let threshold = threshold_rank.and_then(|rank| values.get(rank).copied());
    let diff = match (top, threshold) {
        (Some(t), Some(l)) => Some(t - l),
        _ => None,
    };
    CategoryStats {
        top,
        threshold,
        diff,
    }
}

/// Stored values for a category, if all three are usable numbers.
pub fn stored_stats(stored: &CategorySummary, config: &BoardConfig) -> Option<CategoryStats> {
    let usable = |v: &CellValue| -> Option<f64> {
        if config.is_placeholder(&v.display_text()) {
            None
        } else {
            v.as_f64()
        }
    };
    Some(CategoryStats {
        top: Some(usable(&stored.top_player)?),
        threshold: Some(usable(&stored.lower_player)?),
        diff: Some(usable(&stored.diff)?),
    })
}

/// Prefer stored values; only run `compute` when they are not usable.
pub fn resolve_stats(
    stored: Option<&CategorySummary>,
    config: &BoardConfig,
    compute: impl FnOnce() -> CategoryStats,
) -> ResolvedStats {
    match stored.and_then(|s| stored_stats(s, config)) {
        Some(stats) => ResolvedStats {
            stats,
            source: StatsSource::Stored,
        },
        None => ResolvedStats {
            stats: compute(),
            source: StatsSource::Computed,
        },
    }
}

/// Format a stat the way the summary shows it: whole number or "N/A".
pub fn format_stat(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.0}", v),
        None => "N/A".to_string(),
    }
}
