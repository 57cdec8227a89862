//! Integration tests against real .xlsx files
//!
//! A board is generated with the template writer, then edited through the
//! umya backend. The tests check that rows are really gone, counters are
//! rewritten, and the summary formulas survive the structural edits.

use draft_board::backup::{backup_path, write_backup};
use draft_board::storage::{Storage, XlsxStorage};
use draft_board::template::{write_board, PlayerRecord};
use draft_board::{BoardConfig, DraftSession, Selection};
use std::path::Path;

fn player(position: &str, name: &str, team: &str, points: f64) -> PlayerRecord {
    PlayerRecord {
        position: position.to_string(),
        player: name.to_string(),
        team: team.to_string(),
        points: Some(points),
    }
}

fn players() -> Vec<PlayerRecord> {
    vec![
        player("QB", "Josh Allen", "BUF", 390.0),
        player("QB", "Patrick Mahomes", "KC", 380.0),
        player("QB", "Jalen Hurts", "PHI", 385.0),
        player("QB", "Lamar Jackson", "BAL", 370.0),
        player("RB", "Christian McCaffrey", "SF", 330.0),
        player("RB", "Bijan Robinson", "ATL", 300.0),
        player("K", "Justin Tucker", "BAL", 150.0),
    ]
}

fn config() -> BoardConfig {
    BoardConfig::default().without_restore()
}

fn create_board(path: &Path) {
    let summary = write_board(path, &config(), &players()).unwrap();
    assert!(summary.contains("7 players"), "{}", summary);
}

fn table_len(path: &Path, table: &str) -> usize {
    XlsxStorage::new()
        .load_tables(path)
        .unwrap()
        .into_iter()
        .find(|t| t.name == table)
        .map(|t| t.len())
        .unwrap()
}

#[test]
fn test_new_board_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.xlsx");
    create_board(&path);

    let session = DraftSession::open(XlsxStorage::new(), &path, config()).unwrap();
    let names = session.store().table_names();
    assert_eq!(names[0], "Decision Matrix");
    assert_eq!(session.player_tables().len(), 6);
    assert_eq!(session.store().get("QBs").unwrap().len(), 4);
    assert_eq!(session.store().get("WRs").unwrap().len(), 0);

    let summary = session.summary();
    let qb = summary.categories.iter().find(|c| c.category == "QB").unwrap();
    assert_eq!(qb.drafted, "0/2");
    assert_eq!(qb.slip, "2");
    // Formula results are not cached until a spreadsheet app recalculates
    assert_eq!(qb.stats.stats.top, Some(390.0));
    assert_eq!(qb.stats.stats.threshold, Some(380.0));
}

#[test]
fn test_pick_is_saved_and_formulas_survive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.xlsx");
    create_board(&path);

    let mut session = DraftSession::open(XlsxStorage::new(), &path, config()).unwrap();
    let batch = session.search("mahomes");
    assert_eq!(batch.len(), 1);
    let outcome = session.pick(&batch, &Selection::All).unwrap();
    let report = outcome.flush.unwrap();
    assert!(report.committed);
    assert!(report.reload_error.is_none());
    assert_eq!(report.counter_updates[0].after, "1/2");

    assert_eq!(session.store().get("QBs").unwrap().len(), 3);
    assert_eq!(table_len(&path, "QBs"), 3);
    assert!(session.search("mahomes").is_empty());
    assert_eq!(session.search("jackson").len(), 1);

    let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
    let matrix = book.get_sheet_by_name("Decision Matrix").unwrap();
    assert_eq!(matrix.get_value((2u32, 2u32)), "1/2");
    for row in 4u32..=6 {
        let cell = matrix.get_cell((2u32, row)).unwrap();
        assert!(!cell.get_formula().is_empty(), "row {} lost its formula", row);
    }

    // Reopening sees the same state
    let reopened = DraftSession::open(XlsxStorage::new(), &path, config()).unwrap();
    let qb = reopened
        .summary()
        .categories
        .into_iter()
        .find(|c| c.category == "QB")
        .unwrap();
    assert_eq!(qb.drafted, "1/2");
}

#[test]
fn test_restore_from_backup_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.xlsx");
    create_board(&path);
    write_backup(&path).unwrap();

    let mut session = DraftSession::open(XlsxStorage::new(), &path, config()).unwrap();
    let batch = session.search("tucker");
    session.remove(&batch, &Selection::All).unwrap();
    assert_eq!(table_len(&path, "Ks"), 0);

    let restoring = BoardConfig::default();
    let session = DraftSession::open(XlsxStorage::new(), &path, restoring).unwrap();
    assert_eq!(session.store().get("Ks").unwrap().len(), 1);
    assert!(backup_path(&path).exists());
}

#[test]
fn test_backup_on_write_keeps_previous_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.xlsx");
    create_board(&path);

    let config = config().with_backup_on_write();
    let mut session = DraftSession::open(XlsxStorage::new(), &path, config).unwrap();
    let batch = session.search("robinson");
    session.remove(&batch, &Selection::All).unwrap();

    assert_eq!(table_len(&path, "RBs"), 1);
    assert_eq!(table_len(&backup_path(&path), "RBs"), 2);
}

#[test]
fn test_unreadable_backup_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.xlsx");
    create_board(&path);
    std::fs::create_dir(backup_path(&path)).unwrap();

    let session = DraftSession::open(XlsxStorage::new(), &path, BoardConfig::default()).unwrap();
    assert_eq!(session.store().get("QBs").unwrap().len(), 4);
    assert!(backup_path(&path).is_dir());
}
