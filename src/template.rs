//! Creating a fresh draft board workbook.
//!
//! The board has one sheet per configured category (`Player`, `Team`,
//! `Projected Points`) and a summary sheet whose top / lower / diff rows are
//! formulas over those sheets. The formulas are written with an "N/A" cached
//! result, so until a spreadsheet application recalculates them the summary
//! falls back to computed statistics.

use crate::config::BoardConfig;
use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Formula, Workbook};
use serde::Deserialize;
use std::path::Path;

/// One player row of an import CSV.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayerRecord {
    /// Category code ("QB") or table name ("QBs")
    pub position: String,
    pub player: String,
    #[serde(default)]
    pub team: String,
    pub points: Option<f64>,
}

/// Read `Position,Player,Team,Points` records.
pub fn read_players_csv(path: &Path) -> Result<Vec<PlayerRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open player CSV {}", path.display()))?;
    let mut players = Vec::new();
    for (i, record) in reader.deserialize().enumerate() {
        let player: PlayerRecord =
            record.with_context(|| format!("Failed to read player CSV row {}", i + 1))?;
        players.push(player);
    }
    Ok(players)
}

/// Convert a 0-based column index to an Excel column letter (0=A, 25=Z, 26=AA).
fn col_letter(idx: u32) -> String {
    let mut result = String::new();
    let mut n = idx;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Write a new board to `path`. Returns a one-line summary.
pub fn write_board(path: &Path, config: &BoardConfig, players: &[PlayerRecord]) -> Result<String> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let labels = &config.labels;

    // Summary sheet first so it opens as the active tab
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(&config.summary_table)?;
        sheet.set_column_width(0, 16)?;

        let rows = [
            (1u32, title_case(&labels.my_squad)),
            (2, title_case(&labels.slip)),
            (3, title_case(&labels.top_player)),
            (4, title_case(&labels.lower_player)),
            (5, title_case(&labels.diff)),
        ];
        for (row, label) in &rows {
            sheet.write_string_with_format(*row, 0, label, &bold)?;
        }

        for mapping in &config.categories {
            let col = (mapping.summary_column - 1) as u16;
            let letter = col_letter(col as u32);
            let limit = config
                .default_limits
                .iter()
                .find(|(c, _)| *c == mapping.category)
                .map(|(_, l)| *l)
                .unwrap_or(1);
            let values = format!("'{}'!C:C", mapping.table);

            sheet.write_string_with_format(0, col, &mapping.category, &bold)?;
            sheet.write_string(1, col, format!("0/{}", limit))?;
            sheet.write_number(2, col, limit as f64)?;
            sheet.write_formula(
                3,
                col,
                Formula::new(format!("IF(COUNT({v})=0,\"N/A\",MAX({v}))", v = values))
                    .set_result("N/A"),
            )?;
            sheet.write_formula(
                4,
                col,
                Formula::new(format!(
                    "IFERROR(LARGE({v},{l}3+1),\"N/A\")",
                    v = values,
                    l = letter
                ))
                .set_result("N/A"),
            )?;
            sheet.write_formula(
                5,
                col,
                Formula::new(format!("IFERROR({l}4-{l}5,\"N/A\")", l = letter)).set_result("N/A"),
            )?;
        }

        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        sheet.write_string_with_format(7, 0, "Generated", &bold)?;
        sheet.write_string(7, 1, &now)?;
    }

    let mut written = 0usize;
    let mut skipped = 0usize;
    for mapping in &config.categories {
        let sheet = workbook.add_worksheet();
        sheet.set_name(&mapping.table)?;
        sheet.set_column_width(0, 24)?;
        sheet.write_string_with_format(0, 0, "Player", &bold)?;
        sheet.write_string_with_format(0, 1, "Team", &bold)?;
        sheet.write_string_with_format(0, 2, "Projected Points", &bold)?;

        let mut row = 1u32;
        for p in players.iter().filter(|p| belongs_to(p, &mapping.category, &mapping.table)) {
            sheet.write_string(row, 0, &p.player)?;
            if !p.team.is_empty() {
                sheet.write_string(row, 1, &p.team)?;
            }
            if let Some(points) = p.points {
                sheet.write_number(row, 2, points)?;
            }
            row += 1;
            written += 1;
        }
    }
    for p in players {
        if !config
            .categories
            .iter()
            .any(|m| belongs_to(p, &m.category, &m.table))
        {
            log::warn!("Skipping {}: unknown position '{}'", p.player, p.position);
            skipped += 1;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to write board {}", path.display()))?;

    let mut summary = format!(
        "Created {} with {} player sheets and {} players",
        path.display(),
        config.categories.len(),
        written
    );
    if skipped > 0 {
        summary.push_str(&format!(" ({} skipped: unknown position)", skipped));
    }
    Ok(summary)
}

fn belongs_to(player: &PlayerRecord, category: &str, table: &str) -> bool {
    let pos = player.position.trim();
    pos.eq_ignore_ascii_case(category) || pos.eq_ignore_ascii_case(table)
}

fn title_case(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_col_letter() {
        assert_eq!(col_letter(0), "A");
        assert_eq!(col_letter(1), "B");
        assert_eq!(col_letter(25), "Z");
        assert_eq!(col_letter(26), "AA");
        assert_eq!(col_letter(52), "BA");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("my squad"), "My squad");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_read_players_csv() {
        use std::io::Write;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("players.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "Position,Player,Team,Points").unwrap();
        writeln!(f, "QB, Patrick Mahomes ,KC,380.5").unwrap();
        writeln!(f, "K,Justin Tucker,,").unwrap();
        f.flush().unwrap();

        let players = read_players_csv(&path).unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].player, "Patrick Mahomes");
        assert_eq!(players[0].points, Some(380.5));
        assert_eq!(players[1].team, "");
        assert_eq!(players[1].points, None);
        assert!(belongs_to(&players[0], "QB", "QBs"));
        assert!(!belongs_to(&players[1], "QB", "QBs"));
    }
}
