//! Plain-text rendering of tables, search results and the draft summary.
//!
//! These return strings rather than printing so the CLI and tests share them.

use crate::search::MatchBatch;
use crate::session::DraftSummary;
use crate::stats::{format_stat, StatsSource};
use crate::table::Table;
use std::fmt::Write;

/// Header, column list and the first `max_rows` rows of a table.
pub fn render_table(table: &Table, max_rows: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===", table.name.to_uppercase());
    let _ = writeln!(out, "Total players: {}", table.len());
    if table.is_empty() {
        out.push_str("No players remaining in this sheet!\n");
        return out;
    }
    let _ = writeln!(out, "\nColumns: {}", table.columns.join(", "));

    let shown = max_rows.min(table.len());
    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(c, name)| {
            table.rows[..shown]
                .iter()
                .map(|r| r.cell(c).display_text().chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let _ = writeln!(out, "\nFirst {} players:", shown);
    let header: Vec<String> = table
        .columns
        .iter()
        .zip(&widths)
        .map(|(name, w)| format!("{:>w$}", name, w = *w))
        .collect();
    let _ = writeln!(out, "{}", header.join(" "));
    for row in &table.rows[..shown] {
        let line: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(c, w)| format!("{:>w$}", row.cell(c).display_text(), w = *w))
            .collect();
        let _ = writeln!(out, "{}", line.join(" "));
    }
    if table.len() > shown {
        let _ = writeln!(out, "... and {} more players", table.len() - shown);
    }
    out
}

/// Numbered list of matches for the user to choose from.
pub fn render_matches(batch: &MatchBatch) -> String {
    if batch.is_empty() {
        return format!("No players found matching '{}'\n", batch.query);
    }
    let mut out = String::new();
    let _ = writeln!(out, "Found {} potential matches:", batch.len());
    for (i, m) in batch.matches.iter().enumerate() {
        let data: Vec<String> = m
            .row_data
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect();
        let _ = writeln!(out, "{}. Sheet: {} (matched {})", i + 1, m.table, m.column);
        let _ = writeln!(out, "   Data: {}", data.join(", "));
    }
    out
}

/// Draft status per category followed by remaining players per table.
pub fn render_summary(summary: &DraftSummary) -> String {
    let mut out = String::from("=== DRAFT SUMMARY ===\n");
    if !summary.categories.is_empty() {
        out.push_str("\nYOUR DRAFT STATUS:\n");
        for line in &summary.categories {
            let stats = &line.stats.stats;
            let source = match line.stats.source {
                StatsSource::Stored => "",
                StatsSource::Computed => " (computed)",
            };
            let _ = writeln!(out, "\n{}:", line.category);
            let _ = writeln!(out, "  Drafted: {}", line.drafted);
            let _ = writeln!(out, "  Top Player: {}{}", format_stat(stats.top), source);
            let _ = writeln!(out, "  Lower Player: {}{}", format_stat(stats.threshold), source);
            let _ = writeln!(out, "  Diff: {}{}", format_stat(stats.diff), source);
            let _ = writeln!(out, "  Slip: {}", line.slip);
        }
    }
    out.push_str("\nAVAILABLE PLAYERS:\n");
    for (table, count) in &summary.remaining {
        let _ = writeln!(out, "{}: {} players remaining", table, count);
    }
    let _ = writeln!(out, "TOTAL: {} players remaining", summary.total_remaining());
    out
}
