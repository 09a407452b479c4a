//! Game session: placement, scoring, pool refills, undo and hints.
//!
//! A [`GameSession`] owns all mutable game state. The only ways to change it
//! are [`GameSession::try_place`], [`GameSession::undo`], [`GameSession::hint`]
//! (credits only) and [`GameSession::new_game`].

use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::advisor::{self, Hint};
use crate::generator::PieceSource;
use crate::grid::{Board, Position};
use crate::persistence::ScoreReporter;
use crate::pieces::{all_placed, Color, Piece, Pool, POOL_SIZE, SHAPES};

/// Identifier this game reports scores under.
pub const GAME_ID: &str = "color-blocks";

/// Points for clearing `lines` rows and columns with one placement.
///
/// One line is worth 100; a combo of `n > 1` lines is worth
/// `n * 100 * (n * 0.5)`, which is exactly `50 * n^2`.
pub const fn score_for_lines(lines: u32) -> u32 {
    match lines {
        0 => 0,
        1 => 100,
        n => 50 * n * n,
    }
}

/// Per-session tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub undo_credits: u32,
    pub hint_credits: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            undo_credits: 1,
            hint_credits: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Waiting for the next placement.
    Ready,
    /// No unplaced pool piece fits anywhere. Only a new game (or an undo)
    /// leaves this phase.
    GameOver,
}

/// Why a placement was rejected. The session is unchanged in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceError {
    GameOver,
    NoSuchPiece(usize),
    AlreadyPlaced(usize),
    DoesNotFit { piece_index: usize, position: Position },
}

impl fmt::Display for PlaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceError::GameOver => write!(f, "the game is over"),
            PlaceError::NoSuchPiece(index) => {
                write!(f, "there is no piece {index} (pool holds {POOL_SIZE})")
            }
            PlaceError::AlreadyPlaced(index) => write!(f, "piece {index} is already placed"),
            PlaceError::DoesNotFit {
                piece_index,
                position,
            } => write!(f, "piece {piece_index} does not fit at {position}"),
        }
    }
}

impl std::error::Error for PlaceError {}

/// What a successful placement did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceOutcome {
    pub lines_cleared: u32,
    pub points: u32,
    /// The pool was exhausted and replaced by fresh pieces.
    pub refilled: bool,
    /// This placement ended the game.
    pub game_over: bool,
}

/// Read-only state for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub board: Board,
    pub pool: Pool,
    pub score: u32,
    pub best_score: u32,
    pub undo_credits: u32,
    pub hint_credits: u32,
    pub game_over: bool,
}

/// State captured right before a placement is committed.
#[derive(Debug, Clone, Copy)]
struct HistoryEntry {
    board: Board,
    pool: Pool,
    score: u32,
}

/// One player's game, from start to game over and across restarts.
pub struct GameSession {
    config: SessionConfig,
    board: Board,
    pool: Pool,
    score: u32,
    best_score: u32,
    undo_credits: u32,
    hint_credits: u32,
    phase: Phase,
    history: Vec<HistoryEntry>,
    source: Box<dyn PieceSource>,
    reporter: Box<dyn ScoreReporter>,
}

impl GameSession {
    /// Starts a new game with pieces from `source`.
    pub fn new(
        config: SessionConfig,
        source: Box<dyn PieceSource>,
        reporter: Box<dyn ScoreReporter>,
    ) -> Self {
        // new_game draws the real pool
        let placeholder = [Piece::new(&SHAPES[0], Color::Orange); POOL_SIZE];
        let mut session = Self::from_parts(config, Board::new(), placeholder, source, reporter);
        session.new_game();
        session
    }

    /// Builds a session around a prepared board and pool.
    ///
    /// The session starts ready with full credits and empty history; no play
    /// is recorded and game over is first evaluated after a placement.
    pub fn from_parts(
        config: SessionConfig,
        board: Board,
        pool: Pool,
        source: Box<dyn PieceSource>,
        reporter: Box<dyn ScoreReporter>,
    ) -> Self {
        let best_score = reporter.best_score(GAME_ID);
        Self {
            config,
            board,
            pool,
            score: 0,
            best_score,
            undo_credits: config.undo_credits,
            hint_credits: config.hint_credits,
            phase: Phase::Ready,
            history: Vec::new(),
            source,
            reporter,
        }
    }

    /// Discards the current game and starts over.
    pub fn new_game(&mut self) {
        self.board = Board::new();
        self.pool = self.source.generate_pool();
        self.score = 0;
        self.undo_credits = self.config.undo_credits;
        self.hint_credits = self.config.hint_credits;
        self.phase = Phase::Ready;
        self.history.clear();
        self.reporter.record_play(GAME_ID);
        self.best_score = self.best_score.max(self.reporter.best_score(GAME_ID));
        info!(best_score = self.best_score, "new game");
    }

    /// Places pool piece `piece_index` with its top-left corner at `position`.
    ///
    /// On success the placement is committed, complete lines are cleared and
    /// scored, the pool is refilled once all pieces are used, and game over is
    /// evaluated against the pool that is now active.
    pub fn try_place(
        &mut self,
        piece_index: usize,
        position: Position,
    ) -> Result<PlaceOutcome, PlaceError> {
        if self.phase == Phase::GameOver {
            return Err(PlaceError::GameOver);
        }
        let piece = *self
            .pool
            .get(piece_index)
            .ok_or(PlaceError::NoSuchPiece(piece_index))?;
        if piece.placed {
            return Err(PlaceError::AlreadyPlaced(piece_index));
        }
        if !self.board.can_place(piece.shape, position) {
            return Err(PlaceError::DoesNotFit {
                piece_index,
                position,
            });
        }

        self.push_history();
        self.board.place(piece.shape, piece.color, position);
        self.pool[piece_index].placed = true;

        let cleared = self.board.scan_and_clear();
        let lines_cleared = cleared.count();
        let points = score_for_lines(lines_cleared);
        self.score += points;
        debug!(
            piece_index,
            shape = piece.shape.name,
            %position,
            lines_cleared,
            points,
            score = self.score,
            "placed piece"
        );

        if self.score > self.best_score {
            self.best_score = self.score;
            self.reporter.report_score(GAME_ID, self.score);
        }

        let refilled = all_placed(&self.pool);
        if refilled {
            self.pool = self.source.generate_pool();
            debug!("pool refilled");
        }

        let game_over = !advisor::has_any_move(&self.board, &self.pool);
        if game_over {
            self.phase = Phase::GameOver;
            info!(score = self.score, "game over");
            self.reporter.report_score(GAME_ID, self.score);
        }

        Ok(PlaceOutcome {
            lines_cleared,
            points,
            refilled,
            game_over,
        })
    }

    /// Keeps at most as many snapshots as there are undo credits left.
    fn push_history(&mut self) {
        self.history.push(HistoryEntry {
            board: self.board,
            pool: self.pool,
            score: self.score,
        });
        let keep = self.undo_credits as usize;
        if self.history.len() > keep {
            let excess = self.history.len() - keep;
            self.history.drain(..excess);
        }
    }

    /// Rolls back the most recent placement, spending one undo credit.
    ///
    /// Returns false when there is nothing to undo or no credit left.
    pub fn undo(&mut self) -> bool {
        if self.undo_credits == 0 {
            return false;
        }
        let Some(entry) = self.history.pop() else {
            return false;
        };
        self.board = entry.board;
        self.pool = entry.pool;
        self.score = entry.score;
        self.undo_credits -= 1;
        // a snapshot is always taken from a position with a legal move
        self.phase = Phase::Ready;
        debug!(score = self.score, undo_credits = self.undo_credits, "undo");
        true
    }

    /// First legal move in scan order, spending a hint credit if one is found.
    pub fn hint(&mut self) -> Option<Hint> {
        if self.hint_credits == 0 {
            return None;
        }
        let hint = advisor::first_fit(&self.board, &self.pool)?;
        self.hint_credits -= 1;
        Some(hint)
    }

    /// Whether pool piece `piece_index` would fit at `position` right now.
    ///
    /// For drag previews; the answer is advisory and re-checked on placement.
    pub fn preview(&self, piece_index: usize, position: Position) -> bool {
        self.phase == Phase::Ready
            && self
                .pool
                .get(piece_index)
                .is_some_and(|piece| !piece.placed && self.board.can_place(piece.shape, position))
    }

    /// Reports the current score when the player walks away from the game.
    pub fn leave(&mut self) {
        self.reporter.report_score(GAME_ID, self.score);
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            board: self.board,
            pool: self.pool,
            score: self.score,
            best_score: self.best_score,
            undo_credits: self.undo_credits,
            hint_credits: self.hint_credits,
            game_over: self.is_over(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn undo_credits(&self) -> u32 {
        self.undo_credits
    }

    pub fn hint_credits(&self) -> u32 {
        self.hint_credits
    }
}
