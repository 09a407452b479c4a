//! Color Blocks
//!
//! Terminal front end for the block-placement puzzle. Plays interactively on
//! stdin/stdout, lets a first-fit bot play, and shows or resets the stored
//! statistics.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

use color_blocks::advisor;
use color_blocks::engine::{GameSession, SessionConfig, GAME_ID};
use color_blocks::generator::{PieceSource, RandomPieces};
use color_blocks::grid::BOARD_SIZE;
use color_blocks::persistence::{ScoreReporter, ScoreStore};
use color_blocks::{Position, SessionView};

/// Drop polyomino pieces on an 8x8 board and clear rows and columns.
#[derive(Parser)]
#[command(name = "color-blocks")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file holding high scores and play counts.
    #[arg(long, global = true, default_value = "scores.json")]
    store: PathBuf,

    /// Seed for reproducible piece draws.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Undo credits per game.
    #[arg(long, global = true, default_value_t = 1)]
    undo_credits: u32,

    /// Hint credits per game.
    #[arg(long, global = true, default_value_t = 1)]
    hint_credits: u32,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Play on the terminal (the default).
    Play {
        /// Print the game state as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Let a first-fit bot play and print the final scores.
    Auto {
        #[arg(long, default_value_t = 1)]
        games: u32,
        /// Stop a game after this many placements.
        #[arg(long, default_value_t = 10_000)]
        max_moves: u32,
    },
    /// Show stored statistics, most recently played first.
    Stats,
    /// Reset the Color Blocks statistics.
    Reset,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = SessionConfig {
        undo_credits: cli.undo_credits,
        hint_credits: cli.hint_credits,
    };

    match cli.command {
        None => run_play(&cli.store, cli.seed, config, false),
        Some(Command::Play { json }) => run_play(&cli.store, cli.seed, config, json),
        Some(Command::Auto { games, max_moves }) => {
            let store = open_store_or_memory(&cli.store);
            let scores = run_auto(
                config,
                piece_source(cli.seed),
                Box::new(store),
                games,
                max_moves,
            );
            for (game, score) in scores.iter().enumerate() {
                println!("game {}: {score}", game + 1);
            }
            if let Some(best) = scores.iter().max() {
                println!("best: {best}");
            }
            Ok(())
        }
        Some(Command::Stats) => run_stats(&cli.store),
        Some(Command::Reset) => run_reset(&cli.store),
    }
}

/// Installs a stderr `fmt` subscriber; the default level is WARN.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .with(level)
        .init();
    info!(%level, "logging initialized");
}

fn piece_source(seed: Option<u64>) -> Box<dyn PieceSource> {
    match seed {
        Some(seed) => Box::new(RandomPieces::seeded(seed)),
        None => Box::new(RandomPieces::new()),
    }
}

/// Opens the score store; a broken store must not keep the player from playing.
fn open_store_or_memory(path: &Path) -> ScoreStore {
    ScoreStore::open(path).unwrap_or_else(|err| {
        warn!(path = %path.display(), error = %err, "cannot read scores; playing without them");
        ScoreStore::in_memory()
    })
}

fn run_play(store: &Path, seed: Option<u64>, config: SessionConfig, json: bool) -> Result<()> {
    let store = open_store_or_memory(store);
    let mut session = GameSession::new(config, piece_source(seed), Box::new(store));
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    play_loop(&mut session, stdin.lock(), &mut stdout, json)
}

/// A line of player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Place(usize, Position),
    Preview(usize, Position),
    Undo,
    Hint,
    NewGame,
    Quit,
}

fn parse_action(line: &str) -> Result<Action> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&verb, args)) = words.split_first() else {
        bail!("empty command");
    };

    let placement = |args: &[&str]| -> Result<(usize, Position)> {
        let [piece, x, y] = args else {
            bail!("expected: {verb} <piece> <x> <y>");
        };
        let piece = piece
            .parse::<usize>()
            .with_context(|| format!("bad piece index {piece:?}"))?;
        let x = x.parse::<i32>().with_context(|| format!("bad column {x:?}"))?;
        let y = y.parse::<i32>().with_context(|| format!("bad row {y:?}"))?;
        Ok((piece, Position::new(x, y)))
    };

    let action = match verb {
        "place" | "p" => {
            let (piece, position) = placement(args)?;
            Action::Place(piece, position)
        }
        "preview" | "v" => {
            let (piece, position) = placement(args)?;
            Action::Preview(piece, position)
        }
        "undo" | "u" => Action::Undo,
        "hint" | "h" => Action::Hint,
        "new" | "n" => Action::NewGame,
        "quit" | "q" => Action::Quit,
        other => bail!("unknown command {other:?} (place, preview, undo, hint, new, quit)"),
    };
    Ok(action)
}

/// Runs the interactive game until `quit` or end of input.
fn play_loop(
    session: &mut GameSession,
    input: impl BufRead,
    out: &mut impl Write,
    json: bool,
) -> Result<()> {
    show(&session.view(), out, json)?;

    for line in input.lines() {
        let line = line.context("failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }
        let action = match parse_action(&line) {
            Ok(action) => action,
            Err(err) => {
                writeln!(out, "{err:#}")?;
                continue;
            }
        };

        match action {
            Action::Place(piece, position) => match session.try_place(piece, position) {
                Ok(outcome) => {
                    if outcome.lines_cleared > 0 {
                        writeln!(
                            out,
                            "cleared {} lines, +{}",
                            outcome.lines_cleared, outcome.points
                        )?;
                    }
                }
                Err(err) => writeln!(out, "rejected: {err}")?,
            },
            Action::Preview(piece, position) => {
                let verdict = if session.preview(piece, position) {
                    "fits"
                } else {
                    "does not fit"
                };
                writeln!(out, "piece {piece} {verdict} at {position}")?;
                continue;
            }
            Action::Undo => {
                if !session.undo() {
                    writeln!(out, "nothing to undo")?;
                }
            }
            Action::Hint => match session.hint() {
                Some(hint) => writeln!(out, "hint: piece {} at {}", hint.piece_index, hint.position)?,
                None => writeln!(out, "no hint available")?,
            },
            Action::NewGame => session.new_game(),
            Action::Quit => break,
        }
        show(&session.view(), out, json)?;
    }

    session.leave();
    writeln!(out, "final score: {}", session.score())?;
    Ok(())
}

fn show(view: &SessionView, out: &mut impl Write, json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string(view)?)?;
    } else {
        render(view, out)?;
    }
    Ok(())
}

/// Text rendering: numbered board rows, the pool, then a status line.
fn render(view: &SessionView, out: &mut impl Write) -> io::Result<()> {
    for (y, row) in view.board.to_string().lines().enumerate() {
        writeln!(out, "{y} {row}")?;
    }
    let columns: String = (0..BOARD_SIZE).map(|x| x.to_string()).collect();
    writeln!(out, "  {columns}")?;

    for (index, piece) in view.pool.iter().enumerate() {
        if piece.placed {
            writeln!(out, "[{index}] placed")?;
        } else {
            writeln!(out, "[{index}] {} ({})", piece.shape.name, piece.color)?;
            write!(out, "{piece}")?;
        }
    }

    writeln!(
        out,
        "score {}  best {}  undo {}  hint {}  moves {}",
        view.score,
        view.best_score,
        view.undo_credits,
        view.hint_credits,
        advisor::move_count(&view.board, &view.pool)
    )?;
    if view.game_over {
        writeln!(out, "GAME OVER")?;
    }
    Ok(())
}

/// Plays `games` games with the first legal move each turn; returns the
/// final scores. Hint credits are not involved.
fn run_auto(
    config: SessionConfig,
    source: Box<dyn PieceSource>,
    reporter: Box<dyn ScoreReporter>,
    games: u32,
    max_moves: u32,
) -> Vec<u32> {
    let mut session = GameSession::new(config, source, reporter);
    let mut scores = Vec::with_capacity(games as usize);

    for game in 0..games {
        if game > 0 {
            session.new_game();
        }
        let mut moves = 0;
        while !session.is_over() && moves < max_moves {
            let Some(hint) = advisor::first_fit(session.board(), session.pool()) else {
                break;
            };
            if session.try_place(hint.piece_index, hint.position).is_err() {
                break;
            }
            moves += 1;
        }
        if !session.is_over() {
            session.leave();
        }
        info!(game = game + 1, moves, score = session.score(), "bot game finished");
        scores.push(session.score());
    }

    scores
}

fn run_stats(path: &Path) -> Result<()> {
    let store = ScoreStore::open(path)
        .with_context(|| format!("failed to read scores from {}", path.display()))?;
    let recent = store.recent();
    if recent.is_empty() {
        println!("No games played yet.");
    }
    for (game_id, record) in recent {
        println!(
            "{game_id}: high score {}, played {} times",
            record.high_score, record.play_count
        );
    }
    Ok(())
}

fn run_reset(path: &Path) -> Result<()> {
    let mut store = ScoreStore::open(path)
        .with_context(|| format!("failed to read scores from {}", path.display()))?;
    if store.reset(GAME_ID) {
        store
            .save()
            .with_context(|| format!("failed to write scores to {}", path.display()))?;
        println!("Reset {GAME_ID} statistics.");
    } else {
        println!("No {GAME_ID} statistics to reset.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use color_blocks::generator::ScriptedPieces;
    use color_blocks::persistence::NullReporter;
    use color_blocks::pieces::shape_named;
    use color_blocks::{Board, Color, Piece};

    fn scripted_session() -> GameSession {
        let pool = [
            Piece::new(shape_named("square").unwrap(), Color::Pink),
            Piece::new(shape_named("bar-h").unwrap(), Color::Blue),
            Piece::new(shape_named("monomino").unwrap(), Color::Green),
        ];
        GameSession::from_parts(
            SessionConfig::default(),
            Board::new(),
            pool,
            Box::new(ScriptedPieces::new(pool.to_vec())),
            Box::new(NullReporter),
        )
    }

    #[test]
    fn test_parse_action() {
        assert_eq!(
            parse_action("place 1 3 4").unwrap(),
            Action::Place(1, Position::new(3, 4))
        );
        assert_eq!(
            parse_action("  v 0 -1 2 ").unwrap(),
            Action::Preview(0, Position::new(-1, 2))
        );
        assert_eq!(parse_action("u").unwrap(), Action::Undo);
        assert_eq!(parse_action("hint").unwrap(), Action::Hint);
        assert_eq!(parse_action("n").unwrap(), Action::NewGame);
        assert_eq!(parse_action("quit").unwrap(), Action::Quit);

        assert!(parse_action("").is_err());
        assert!(parse_action("p 1 2").is_err());
        assert!(parse_action("p x 2 3").is_err());
        assert!(parse_action("rotate").is_err());
    }

    #[test]
    fn test_render_snapshot() {
        let mut session = scripted_session();
        session.try_place(0, Position::new(0, 0)).unwrap();

        let mut output = Vec::new();
        render(&session.view(), &mut output).unwrap();
        let output = String::from_utf8(output).unwrap();

        insta::assert_snapshot!(output, @r"
        0 PP......
        1 PP......
        2 ........
        3 ........
        4 ........
        5 ........
        6 ........
        7 ........
          01234567
        [0] placed
        [1] bar-h (blue)
        BBB
        [2] monomino (green)
        G
        score 0  best 0  undo 1  hint 1  moves 104
        ");
    }

    #[test]
    fn test_play_loop_script() {
        let mut session = scripted_session();
        let input = "p 0 0 0\nbogus\np 0 5 5\nh\nu\nv 0 6 6\nq\np 1 0 0\n";
        let mut output = Vec::new();
        play_loop(&mut session, input.as_bytes(), &mut output, false).unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.contains("unknown command \"bogus\""), "{output}");
        assert!(output.contains("rejected: piece 0 is already placed"), "{output}");
        assert!(output.contains("hint: piece 1 at (2, 0)"), "{output}");
        assert!(output.contains("piece 0 fits at (6, 6)"), "{output}");
        assert!(output.ends_with("final score: 0\n"), "{output}");
        assert!(session.board().is_empty(), "undo rolled back the square");
        assert!(session.pool().iter().all(|piece| !piece.placed));
    }

    #[test]
    fn test_play_loop_json() {
        let mut session = scripted_session();
        let mut output = Vec::new();
        play_loop(&mut session, "q\n".as_bytes(), &mut output, true).unwrap();
        let output = String::from_utf8(output).unwrap();
        let first = output.lines().next().unwrap();
        let value: serde_json::Value = serde_json::from_str(first).unwrap();
        assert_eq!(value["score"], 0);
        assert_eq!(value["undoCredits"], 1);
        assert_eq!(value["gameOver"], false);
        assert_eq!(value["pool"][0]["shape"]["name"], "square");
        assert_eq!(value["pool"][1]["color"], "blue");
    }

    #[test]
    fn test_auto_is_reproducible() {
        let play = || {
            run_auto(
                SessionConfig::default(),
                Box::new(RandomPieces::seeded(2024)),
                Box::new(NullReporter),
                3,
                2_000,
            )
        };
        let first = play();
        assert_eq!(first.len(), 3);
        assert_eq!(first, play());
    }
}
