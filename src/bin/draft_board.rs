//! Draft Board CLI
//!
//! Runs an interactive draft session against a board workbook, or answers
//! one-shot queries about it. Edits (remove, pick, slip) are only available
//! in the interactive session, where they are written back to the workbook.
//!
//! Usage: draft-board <WORKBOOK> [interactive|tables|rows|search|summary|new-board]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use draft_board::report::{render_matches, render_summary, render_table};
use draft_board::session::parse_selection;
use draft_board::storage::XlsxStorage;
use draft_board::template::{read_players_csv, write_board};
use draft_board::{BoardConfig, CellValue, DraftSession, FlushReport, MatchBatch};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "draft-board")]
#[command(about = "Track a fantasy draft in an xlsx draft board")]
struct Cli {
    /// Draft board workbook (.xlsx)
    #[arg(env = "DRAFT_BOARD_WORKBOOK")]
    workbook: PathBuf,

    /// Do not restore the workbook from its _backup copy on start
    #[arg(long)]
    no_restore: bool,

    /// Copy the workbook to its _backup copy before every save
    #[arg(long)]
    backup_on_write: bool,

    /// Keep edits pending until an explicit `flush`
    #[arg(long)]
    no_auto_flush: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive draft session (default)
    Interactive,

    /// List the sheets of the board
    Tables,

    /// Show the first rows of a sheet
    Rows {
        /// Sheet name
        table: String,

        /// Number of rows to show
        #[arg(short, long, default_value = "5")]
        max: usize,
    },

    /// Search players by (part of) their name
    Search {
        query: String,
    },

    /// Show the draft summary
    Summary,

    /// Create a new, empty board at WORKBOOK
    NewBoard {
        /// CSV with Position,Player,Team,Points columns to seed the sheets
        #[arg(short, long)]
        players: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = BoardConfig::default().with_auto_flush(!cli.no_auto_flush);
    let config = if cli.no_restore {
        config.without_restore()
    } else {
        config
    };
    let config = if cli.backup_on_write {
        config.with_backup_on_write()
    } else {
        config
    };

    let command = cli.command.unwrap_or(Commands::Interactive);
    if let Commands::NewBoard { players } = &command {
        let players = match players {
            Some(path) => read_players_csv(path)?,
            None => Vec::new(),
        };
        println!("{}", write_board(&cli.workbook, &config, &players)?);
        return Ok(());
    }

    if !cli.workbook.exists() {
        anyhow::bail!("Workbook not found at {}", cli.workbook.display());
    }

    // One-shot queries never write, so they must not restore over the workbook either
    let config = match command {
        Commands::Interactive => config,
        _ => config.without_restore(),
    };
    let mut session = DraftSession::open(XlsxStorage::new(), &cli.workbook, config)
        .with_context(|| format!("Failed to load {}", cli.workbook.display()))?;

    match command {
        Commands::Interactive => run_interactive(&mut session)?,
        Commands::Tables => {
            for name in session.store().table_names() {
                let rows = session.store().get(name).map(|t| t.len()).unwrap_or(0);
                println!("{} ({} rows)", name, rows);
            }
        }
        Commands::Rows { table, max } => match session.store().get(&table) {
            Some(t) => print!("{}", render_table(t, max)),
            None => anyhow::bail!("Sheet '{}' not found", table),
        },
        Commands::Search { query } => print!("{}", render_matches(&session.search(&query))),
        Commands::Summary => print!("{}", render_summary(&session.summary())),
        Commands::NewBoard { .. } => {}
    }
    Ok(())
}

const HELP: &str = "\
Commands:
  all                    show all player sheets
  tables                 list sheets
  rows <sheet> [n]       show first n players of a sheet
  search <name>          search players; results are numbered
  remove <1,3|all|none>  remove players from the last search (drafted by others)
  pick <1,3|all|none>    pick players from the last search for your team
  slip <POS> <n>         set the slip value of a position
  flush                  write pending edits to the workbook
  pending                show pending edits
  reload                 re-read the workbook
  summary                show the draft summary
  help                   show this help
  quit                   exit";

fn run_interactive(session: &mut DraftSession<XlsxStorage>) -> Result<()> {
    println!("Welcome to the Draft Board!");
    println!("Managing workbook: {}", session.path().display());
    println!("{}", HELP);

    let stdin = io::stdin();
    let mut last: Option<MatchBatch> = None;

    loop {
        print!("\n> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        match cmd.to_lowercase().as_str() {
            "" => {}
            "help" | "?" => println!("{}", HELP),
            "quit" | "exit" | "q" => break,
            "all" => {
                for name in session.player_tables() {
                    if let Some(t) = session.store().get(name) {
                        println!("\n{}", render_table(t, 5));
                    }
                }
            }
            "tables" => {
                for (i, name) in session.player_tables().iter().enumerate() {
                    println!("{}. {}", i + 1, name);
                }
            }
            "rows" => {
                let mut parts = rest.rsplitn(2, ' ');
                let (table, max) = match (parts.next(), parts.next()) {
                    (Some(n), Some(t)) if n.parse::<usize>().is_ok() => {
                        (t.trim(), n.parse::<usize>().unwrap_or(5))
                    }
                    _ => (rest, 5),
                };
                match session.store().get(table) {
                    Some(t) => print!("{}", render_table(t, max)),
                    None => println!("Sheet '{}' not found!", table),
                }
            }
            "search" | "s" => {
                if rest.is_empty() {
                    println!("Please enter a name to search for!");
                    continue;
                }
                if session.store().is_stale() {
                    println!("The board is out of date; use 'reload' before picking");
                }
                let batch = session.search(rest);
                print!("{}", render_matches(&batch));
                last = Some(batch);
            }
            "remove" | "pick" => {
                let Some(batch) = last.as_ref() else {
                    println!("Search for a player first");
                    continue;
                };
                let selection = match parse_selection(rest) {
                    Ok(s) => s,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };
                let result = if cmd.eq_ignore_ascii_case("pick") {
                    session.pick(batch, &selection)
                } else {
                    session.remove(batch, &selection)
                };
                match result {
                    Ok(outcome) => {
                        let verb = if cmd.eq_ignore_ascii_case("pick") {
                            "Picked"
                        } else {
                            "Removed"
                        };
                        if outcome.applied.is_empty() {
                            println!("No players were selected");
                        } else {
                            println!("{} {} player(s)", verb, outcome.applied.len());
                        }
                        for pos in &outcome.ignored {
                            println!("Ignored {}: no such match", pos);
                        }
                        if let Some(report) = &outcome.flush {
                            print_flush(report);
                            last = None;
                        }
                    }
                    Err(e) => println!("Error: {:#}", e),
                }
            }
            "slip" => {
                let mut parts = rest.split_whitespace();
                let (Some(pos), Some(value)) = (parts.next(), parts.next()) else {
                    println!("Usage: slip <POS> <n>");
                    continue;
                };
                let Ok(value) = value.parse::<i64>() else {
                    println!("Invalid value for {}, skipping...", pos);
                    continue;
                };
                match session.set_slip(pos, CellValue::from(value)) {
                    Ok(Some(report)) => {
                        print_flush(&report);
                        last = None;
                    }
                    Ok(None) => println!("Slip value for {} pending", pos.to_uppercase()),
                    Err(e) => println!("Error: {:#}", e),
                }
            }
            "flush" | "save" => match session.flush() {
                Ok(report) => {
                    print_flush(&report);
                    if report.committed {
                        last = None;
                    }
                }
                Err(e) => println!("Error saving workbook: {} (pending edits kept)", e),
            },
            "pending" => {
                let pending = session.pending();
                if pending.is_empty() {
                    println!("No pending edits");
                }
                for (table, rows) in pending.deletions() {
                    println!("{}: delete rows {:?}", table, rows);
                }
                for (category, delta) in pending.counter_deltas() {
                    println!("{}: squad {:+}", category, delta);
                }
                for (category, value) in pending.scalar_overwrites() {
                    println!("{}: slip -> {}", category, value);
                }
            }
            "reload" => match session.reload() {
                Ok(()) => {
                    println!("Reloaded {}", session.path().display());
                    last = None;
                }
                Err(e) => println!("Error: {}", e),
            },
            "summary" => print!("{}", render_summary(&session.summary())),
            other => println!("Unknown command '{}'; type 'help'", other),
        }
    }

    if !session.pending().is_empty() {
        println!(
            "Warning: exiting with {} unsaved row deletion(s)",
            session.pending().deletion_count()
        );
    }
    println!("Thanks for using the Draft Board!");
    Ok(())
}

fn print_flush(report: &FlushReport) {
    println!("{}", report.describe());
    if report.reload_error.is_some() {
        println!("The board shown may be out of date; use 'reload'");
    }
}
