//! Board configuration.
//!
//! Everything the engine matches by name lives here: which sheets hold which
//! category, which labels identify the summary rows, and which column names
//! count as the ranking value. Lists are searched in order and the first match
//! wins.

/// Maps a player table to its category and to the summary column that holds
/// the category's counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMapping {
    /// Sheet name, e.g. "QBs"
    pub table: String,
    /// Category key, e.g. "QB"
    pub category: String,
    /// 1-based column of this category in the summary table (B = 2)
    pub summary_column: u32,
}

impl CategoryMapping {
    pub fn new(table: &str, category: &str, summary_column: u32) -> Self {
        Self {
            table: table.to_string(),
            category: category.to_string(),
            summary_column,
        }
    }
}

/// Row labels of the summary table, compared trimmed and case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLabels {
    pub my_squad: String,
    pub slip: String,
    pub top_player: String,
    pub lower_player: String,
    pub diff: String,
}

impl Default for SummaryLabels {
    fn default() -> Self {
        Self {
            my_squad: "my squad".to_string(),
            slip: "slip".to_string(),
            top_player: "top player".to_string(),
            lower_player: "lower player".to_string(),
            diff: "diff".to_string(),
        }
    }
}

/// When the sibling `_backup` file is read or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupPolicy {
    /// Copy the backup over the primary file before loading
    pub restore_on_start: bool,
    /// Copy the primary file to the backup before each non-empty flush
    pub backup_on_write: bool,
}

impl Default for BackupPolicy {
    fn default() -> Self {
        Self {
            restore_on_start: true,
            backup_on_write: false,
        }
    }
}

/// Configuration for a draft board session.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Name of the summary sheet
    pub summary_table: String,
    /// Offset from zero-based row index to 1-based persisted row (header + 1)
    pub header_offset: u32,
    /// Player tables in display order
    pub categories: Vec<CategoryMapping>,
    pub labels: SummaryLabels,
    /// Substrings identifying the ranking value column
    pub value_column_synonyms: Vec<String>,
    /// Cell texts treated as "not available" in the summary table
    pub placeholders: Vec<String>,
    pub backup: BackupPolicy,
    /// Flush immediately after every remove/pick/slip action
    pub auto_flush: bool,
    /// Roster limit per category used when creating a new board
    pub default_limits: Vec<(String, u32)>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            summary_table: "Decision Matrix".to_string(),
            header_offset: 2,
            categories: vec![
                CategoryMapping::new("QBs", "QB", 2),
                CategoryMapping::new("RBs", "RB", 3),
                CategoryMapping::new("WRs", "WR", 4),
                CategoryMapping::new("Ks", "K", 5),
                CategoryMapping::new("Ds", "D", 6),
                CategoryMapping::new("TEs", "TE", 7),
            ],
            labels: SummaryLabels::default(),
            value_column_synonyms: vec![
                "point".to_string(),
                "projected".to_string(),
                "season".to_string(),
            ],
            placeholders: vec!["N/A".to_string()],
            backup: BackupPolicy::default(),
            auto_flush: true,
            default_limits: vec![
                ("QB".to_string(), 2),
                ("RB".to_string(), 5),
                ("WR".to_string(), 5),
                ("K".to_string(), 1),
                ("D".to_string(), 1),
                ("TE".to_string(), 2),
            ],
        }
    }
}

impl BoardConfig {
    /// Disable restore-on-start
    pub fn without_restore(mut self) -> Self {
        self.backup.restore_on_start = false;
        self
    }

    /// Enable backup-on-write
    pub fn with_backup_on_write(mut self) -> Self {
        self.backup.backup_on_write = true;
        self
    }

    pub fn with_auto_flush(mut self, auto_flush: bool) -> Self {
        self.auto_flush = auto_flush;
        self
    }

    /// Category for a player table, or `None` for unmapped tables.
    pub fn category_for_table(&self, table: &str) -> Option<&CategoryMapping> {
        self.categories.iter().find(|m| m.table == table)
    }

    pub fn mapping_for_category(&self, category: &str) -> Option<&CategoryMapping> {
        self.categories.iter().find(|m| m.category == category)
    }

    pub fn is_summary_table(&self, table: &str) -> bool {
        self.summary_table == table
    }

    /// True for empty text, configured placeholders and spreadsheet error literals.
    pub fn is_placeholder(&self, text: &str) -> bool {
        let trimmed = text.trim();
        trimmed.is_empty()
            || trimmed.starts_with('#')
            || self
                .placeholders
                .iter()
                .any(|p| p.eq_ignore_ascii_case(trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_lookup() {
        let config = BoardConfig::default();
        assert_eq!(config.category_for_table("QBs").unwrap().category, "QB");
        assert_eq!(config.category_for_table("TEs").unwrap().summary_column, 7);
        assert!(config.category_for_table("Decision Matrix").is_none());
        assert_eq!(config.mapping_for_category("WR").unwrap().table, "WRs");
    }

    #[test]
    fn test_placeholders() {
        let config = BoardConfig::default();
        assert!(config.is_placeholder(""));
        assert!(config.is_placeholder("  n/a "));
        assert!(config.is_placeholder("#REF!"));
        assert!(!config.is_placeholder("312"));
    }

    #[test]
    fn test_builders() {
        let config = BoardConfig::default()
            .without_restore()
            .with_backup_on_write()
            .with_auto_flush(false);
        assert!(!config.backup.restore_on_start);
        assert!(config.backup.backup_on_write);
        assert!(!config.auto_flush);
    }
}
