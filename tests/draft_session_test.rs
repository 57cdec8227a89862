//! Integration tests for draft sessions over an in-memory workbook
//!
//! These drive the public session API the same way the CLI does: search,
//! select, pick or remove, flush, and then check what ended up in the
//! stored workbook.

use draft_board::session::parse_selection;
use draft_board::storage::memory::MemorySheet;
use draft_board::storage::{FailPoint, MemoryStorage};
use draft_board::{BoardConfig, CellValue, DraftSession, FlushStage, Selection, SelectionError};
use std::path::Path;

const BOARD: &str = "FF - main.xlsx";

fn qbs() -> MemorySheet {
    MemorySheet::new(
        "QBs",
        vec![
            vec!["Player".into(), "Team".into(), "Projected Points".into()],
            vec!["Josh Allen".into(), "BUF".into(), CellValue::Number(392.0)],
            vec!["Jalen Hurts".into(), "PHI".into(), CellValue::Number(385.0)],
            vec!["Patrick Mahomes".into(), "KC".into(), CellValue::Number(380.0)],
            vec!["Lamar Jackson".into(), "BAL".into(), CellValue::Number(371.0)],
            vec!["Joe Burrow".into(), "CIN".into(), CellValue::Number(360.0)],
        ],
    )
}

fn rbs() -> MemorySheet {
    MemorySheet::new(
        "RBs",
        vec![
            vec!["Player".into(), "Team".into(), "Projected Points".into()],
            vec!["Christian McCaffrey".into(), "SF".into(), CellValue::Number(330.0)],
            vec!["Bijan Robinson".into(), "ATL".into(), CellValue::Number(300.0)],
            vec!["Breece Hall".into(), "NYJ".into(), CellValue::Number(280.0)],
        ],
    )
}

fn decision_matrix(qb_squad: &str) -> MemorySheet {
    MemorySheet::new(
        "Decision Matrix",
        vec![
            vec![CellValue::Empty, "QB".into(), "RB".into()],
            vec!["My squad".into(), qb_squad.into(), "0/5".into()],
            vec!["Slip".into(), CellValue::Number(2.0), CellValue::Number(1.0)],
            vec!["Top player".into(), CellValue::Number(400.0), "N/A".into()],
            vec!["Lower player".into(), CellValue::Number(350.0), "N/A".into()],
            vec!["Diff".into(), CellValue::Number(50.0), "N/A".into()],
        ],
    )
}

fn open(storage: &MemoryStorage, auto_flush: bool) -> DraftSession<MemoryStorage> {
    let config = BoardConfig::default()
        .without_restore()
        .with_auto_flush(auto_flush);
    DraftSession::open(storage.clone(), Path::new(BOARD), config).unwrap()
}

fn board(qb_squad: &str) -> MemoryStorage {
    let storage = MemoryStorage::new();
    storage.insert(BOARD, vec![qbs(), rbs(), decision_matrix(qb_squad)]);
    storage
}

fn sheet(storage: &MemoryStorage, name: &str) -> MemorySheet {
    storage
        .sheets(Path::new(BOARD))
        .unwrap()
        .into_iter()
        .find(|s| s.name == name)
        .unwrap()
}

#[test]
fn test_pick_updates_counter_and_removes_row() {
    let storage = board("0/1");
    let mut session = open(&storage, true);

    let batch = session.search("mahomes");
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.matches[0].table, "QBs");
    assert_eq!(batch.matches[0].column, "Player");

    let outcome = session.pick(&batch, &parse_selection("1").unwrap()).unwrap();
    let report = outcome.flush.expect("auto flush after pick");
    assert!(report.committed);
    assert_eq!(report.deleted["QBs"], vec![4]);
    assert_eq!(report.counter_updates[0].before, "0/1");
    assert_eq!(report.counter_updates[0].after, "1/1");

    assert!(session.pending().is_empty());
    let qbs = session.store().get("QBs").unwrap();
    assert_eq!(qbs.len(), 4);
    assert!(session.search("mahomes").is_empty());

    let matrix = sheet(&storage, "Decision Matrix");
    assert_eq!(matrix.grid[1][1], CellValue::Text("1/1".to_string()));
    assert_eq!(sheet(&storage, "QBs").grid.len(), 5);
}

#[test]
fn test_removals_across_tables_in_one_flush() {
    let storage = board("0/2");
    let mut session = open(&storage, false);

    // Mark out of order; flush must still delete bottom-up
    let batch = session.search("burrow");
    session.remove(&batch, &Selection::All).unwrap();
    let batch = session.search("allen");
    session.remove(&batch, &Selection::All).unwrap();
    let batch = session.search("hall");
    session.remove(&batch, &Selection::All).unwrap();
    assert_eq!(session.pending().deletion_count(), 3);
    assert_eq!(storage.save_count(), 0);

    let report = session.flush().unwrap();
    assert_eq!(report.deleted["QBs"], vec![6, 2]);
    assert_eq!(report.deleted["RBs"], vec![4]);
    assert!(report.counter_updates.is_empty());

    let names: Vec<String> = sheet(&storage, "QBs").grid[1..]
        .iter()
        .map(|r| r[0].display_text())
        .collect();
    assert_eq!(names, vec!["Jalen Hurts", "Patrick Mahomes", "Lamar Jackson"]);
    assert_eq!(session.store().get("RBs").unwrap().len(), 2);
    assert_eq!(storage.save_count(), 1);
}

#[test]
fn test_marking_same_row_twice_deletes_once() {
    let storage = board("0/2");
    let mut session = open(&storage, false);

    let first = session.search("hurts");
    session.remove(&first, &Selection::All).unwrap();
    let second = session.search("jalen");
    session.remove(&second, &Selection::All).unwrap();
    assert_eq!(session.pending().deletion_count(), 1);

    let report = session.flush().unwrap();
    assert_eq!(report.rows_deleted(), 1);
    assert_eq!(session.store().get("QBs").unwrap().len(), 4);
}

#[test]
fn test_search_spans_player_tables_only() {
    let storage = board("0/2");
    let session = open(&storage, false);

    let batch = session.search("LL");
    let hits: Vec<(String, String)> = batch
        .matches
        .iter()
        .map(|m| (m.table.clone(), m.label()))
        .collect();
    assert_eq!(
        hits,
        vec![
            ("QBs".to_string(), "Josh Allen".to_string()),
            ("RBs".to_string(), "Breece Hall".to_string()),
        ]
    );

    // Labels of the summary sheet are never search hits
    assert!(session.search("squad").is_empty());
}

#[test]
fn test_failed_save_keeps_pending_edits() {
    let storage = board("0/2");
    let mut session = open(&storage, false);

    let batch = session.search("mahomes");
    session.pick(&batch, &Selection::All).unwrap();

    storage.fail_next(FailPoint::Save);
    let err = session.flush().unwrap_err();
    assert_eq!(err.stage, FlushStage::Persisting);
    assert_eq!(session.pending().deletion_count(), 1);
    assert_eq!(session.pending().counter_deltas()["QB"], 1);
    assert_eq!(sheet(&storage, "QBs").grid.len(), 6);

    // Retrying applies exactly the same edits
    let report = session.flush().unwrap();
    assert_eq!(report.counter_updates[0].after, "1/2");
    assert_eq!(sheet(&storage, "QBs").grid.len(), 5);
}

#[test]
fn test_summary_prefers_stored_stats() {
    let storage = board("1/2");
    let session = open(&storage, false);
    let summary = session.summary();

    let qb = summary.categories.iter().find(|c| c.category == "QB").unwrap();
    assert_eq!(qb.drafted, "1/2");
    assert_eq!(qb.slip, "2");
    assert_eq!(qb.stats.stats.top, Some(400.0));
    assert_eq!(qb.stats.stats.threshold, Some(350.0));

    // RB has only placeholders stored, so the stats come from the sheet
    let rb = summary.categories.iter().find(|c| c.category == "RB").unwrap();
    assert_eq!(rb.stats.stats.top, Some(330.0));
    assert_eq!(rb.stats.stats.threshold, Some(300.0));
    assert_eq!(rb.stats.stats.diff, Some(30.0));

    assert_eq!(summary.total_remaining(), 8);
}

#[test]
fn test_slip_update_is_written() {
    let storage = board("0/2");
    let mut session = open(&storage, true);

    let report = session.set_slip("rb", CellValue::Number(2.0)).unwrap().unwrap();
    assert_eq!(report.scalar_updates[0].category, "RB");
    assert_eq!(report.scalar_updates[0].before, CellValue::Number(1.0));

    let matrix = sheet(&storage, "Decision Matrix");
    assert_eq!(matrix.grid[2][2], CellValue::Number(2.0));
    let rb = session
        .summary()
        .categories
        .into_iter()
        .find(|c| c.category == "RB")
        .unwrap();
    assert_eq!(rb.stats.stats.threshold, Some(280.0));
}

#[test]
fn test_selection_refused_until_reload_after_failed_reload() {
    let storage = board("0/2");
    let mut session = open(&storage, true);

    let before = session.search("a");
    let batch = session.search("allen");
    storage.fail_next(FailPoint::Load);
    let report = session.remove(&batch, &Selection::All).unwrap().flush.unwrap();
    assert!(report.committed);
    assert!(report.reload_error.is_some());
    assert!(session.store().is_stale());

    // The snapshot still lists Allen, the file does not
    let hurts = session.search("hurts");
    let err = session.remove(&hurts, &Selection::All).unwrap_err();
    assert_eq!(
        err.downcast_ref::<SelectionError>(),
        Some(&SelectionError::SnapshotStale)
    );
    assert!(session.pick(&before, &Selection::All).is_err());
    assert!(session.pending().is_empty());

    session.reload().unwrap();
    assert!(!session.store().is_stale());
    assert!(matches!(
        session.remove(&before, &Selection::All).unwrap_err().downcast_ref::<SelectionError>(),
        Some(SelectionError::Stale { .. })
    ));

    let hurts = session.search("hurts");
    session.remove(&hurts, &Selection::All).unwrap();
    let names: Vec<String> = sheet(&storage, "QBs").grid[1..]
        .iter()
        .map(|r| r[0].display_text())
        .collect();
    assert_eq!(names, vec!["Patrick Mahomes", "Lamar Jackson", "Joe Burrow"]);
}
