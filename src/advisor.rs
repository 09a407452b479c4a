//! Move search over the board for hints and game-over detection.
//!
//! Candidate placements are enumerated as occupancy bitmasks, so testing a
//! placement is a single AND against the board's occupancy mask.

use crate::grid::{Board, Position, BOARD_SIZE};
use crate::pieces::{Pool, Shape};

/// A suggested move: which pool piece to place, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hint {
    pub piece_index: usize,
    pub position: Position,
}

/// Every on-board anchor for `shape`, row-major (y outer, x inner), paired
/// with the occupancy mask of the shape at that anchor.
///
/// Shapes are tight, so a shape fits on the board exactly when its bounding
/// box does.
pub fn placements(shape: &Shape) -> impl Iterator<Item = (Position, u64)> {
    let base = shape.mask();
    let max_x = BOARD_SIZE - shape.width();
    let max_y = BOARD_SIZE - shape.height();

    (0..=max_y).flat_map(move |y| {
        (0..=max_x).map(move |x| {
            let position = Position::new(x as i32, y as i32);
            (position, base << (y * BOARD_SIZE + x))
        })
    })
}

/// Legal anchors for `shape` on a board with the given occupancy.
#[inline]
fn open_placements(shape: &Shape, occupied: u64) -> impl Iterator<Item = Position> {
    placements(shape)
        .filter(move |&(_, mask)| occupied & mask == 0)
        .map(|(position, _)| position)
}

/// First legal move in scan order: pool pieces by index, skipping placed
/// ones, then anchors row-major.
pub fn first_fit(board: &Board, pool: &Pool) -> Option<Hint> {
    let occupied = board.occupancy();
    pool.iter()
        .enumerate()
        .filter(|(_, piece)| !piece.placed)
        .find_map(|(piece_index, piece)| {
            open_placements(piece.shape, occupied)
                .next()
                .map(|position| Hint {
                    piece_index,
                    position,
                })
        })
}

/// True if any unplaced piece of the pool fits anywhere on the board.
pub fn has_any_move(board: &Board, pool: &Pool) -> bool {
    first_fit(board, pool).is_some()
}

/// Number of legal `(piece, anchor)` pairs across the unplaced pieces.
pub fn move_count(board: &Board, pool: &Pool) -> usize {
    let occupied = board.occupancy();
    pool.iter()
        .filter(|piece| !piece.placed)
        .map(|piece| open_placements(piece.shape, occupied).count())
        .sum()
}
