//! The 8x8 board and its line-clearing rules.
//!
//! Cells are stored row-major as `cells[y][x]`. For fast collision checks the
//! board also exposes an occupancy bitmask where bit `y * BOARD_SIZE + x` is
//! set for every filled cell; 64 cells fit exactly in a `u64`.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::pieces::{Color, Shape};

/// Cells per side of the square board.
pub const BOARD_SIZE: usize = 8;

/// Bits of row 0 in the occupancy mask.
const ROW_MASK: u64 = 0xFF;

/// Bits of column 0 in the occupancy mask.
const COLUMN_MASK: u64 = 0x0101_0101_0101_0101;

/// A grid coordinate. Placements anchor a shape's top-left corner here.
///
/// Signed so that input adapters can pass raw drag results; anything outside
/// `0..BOARD_SIZE` is simply rejected by placement checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Board cell covered by shape offset `(dx, dy)`, if it is on the board.
    #[inline]
    fn offset(self, dx: usize, dy: usize) -> Option<(usize, usize)> {
        let x = self.x.checked_add(dx as i32)?;
        let y = self.y.checked_add(dy as i32)?;
        let range = 0..BOARD_SIZE as i32;
        if range.contains(&x) && range.contains(&y) {
            Some((x as usize, y as usize))
        } else {
            None
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Rows and columns completed by a placement, as bitsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineClear {
    /// Bit `y` set when row `y` was complete.
    pub rows: u8,
    /// Bit `x` set when column `x` was complete.
    pub columns: u8,
}

impl LineClear {
    /// Completed rows plus completed columns.
    pub fn count(&self) -> u32 {
        self.rows.count_ones() + self.columns.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 && self.columns == 0
    }
}

/// The playing field. Each cell is empty or holds a color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Board {
    cells: [[Option<Color>; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Color at `position`, or `None` when empty or off the board.
    pub fn cell(&self, position: Position) -> Option<Color> {
        let (x, y) = position.offset(0, 0)?;
        self.cells[y][x]
    }

    /// Checks that every cell of `shape` anchored at `position` is on the
    /// board and empty.
    pub fn can_place(&self, shape: &Shape, position: Position) -> bool {
        shape.cells().all(|(dx, dy)| match position.offset(dx, dy) {
            Some((x, y)) => self.cells[y][x].is_none(),
            None => false,
        })
    }

    /// Writes `color` into every cell covered by `shape` at `position`.
    ///
    /// Callers must have checked [`Board::can_place`] against the current
    /// board; the engine re-checks right before every commit.
    pub fn place(&mut self, shape: &Shape, color: Color, position: Position) {
        debug_assert!(
            self.can_place(shape, position),
            "placing {} at {position} overlaps or leaves the board",
            shape.name
        );
        for (dx, dy) in shape.cells() {
            if let Some((x, y)) = position.offset(dx, dy) {
                self.cells[y][x] = Some(color);
            }
        }
    }

    /// Clears every complete row and column.
    ///
    /// Complete lines are determined on the board as it is before clearing,
    /// so a cell shared by a complete row and a complete column is cleared
    /// once but counts toward both lines.
    pub fn scan_and_clear(&mut self) -> LineClear {
        let occupied = self.occupancy();
        let mut cleared = LineClear::default();

        for i in 0..BOARD_SIZE {
            let row = ROW_MASK << (i * BOARD_SIZE);
            if occupied & row == row {
                cleared.rows |= 1 << i;
            }
            let column = COLUMN_MASK << i;
            if occupied & column == column {
                cleared.columns |= 1 << i;
            }
        }

        for (y, row) in self.cells.iter_mut().enumerate() {
            let row_complete = cleared.rows & (1 << y) != 0;
            for (x, cell) in row.iter_mut().enumerate() {
                if row_complete || cleared.columns & (1 << x) != 0 {
                    *cell = None;
                }
            }
        }

        cleared
    }

    /// Occupancy bitmask, bit `y * BOARD_SIZE + x` per filled cell.
    pub fn occupancy(&self) -> u64 {
        let mut mask = 0u64;
        for (y, row) in self.cells.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if cell.is_some() {
                    mask |= 1 << (y * BOARD_SIZE + x);
                }
            }
        }
        mask
    }

    pub fn filled_count(&self) -> usize {
        self.occupancy().count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.occupancy() == 0
    }

    /// Rows of the board, top to bottom.
    pub fn rows(&self) -> &[[Option<Color>; BOARD_SIZE]; BOARD_SIZE] {
        &self.cells
    }
}

/// One line per row; `.` marks an empty cell, otherwise the color glyph.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            for cell in row {
                let glyph = cell.map_or('.', Color::glyph);
                write!(f, "{glyph}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Error returned when parsing a board from text fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBoardError(String);

impl fmt::Display for ParseBoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid board: {}", self.0)
    }
}

impl std::error::Error for ParseBoardError {}

/// Parses the [`Display`](fmt::Display) format: eight lines of eight glyphs.
impl FromStr for Board {
    type Err = ParseBoardError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if lines.len() != BOARD_SIZE {
            return Err(ParseBoardError(format!(
                "expected {BOARD_SIZE} rows, found {}",
                lines.len()
            )));
        }

        let mut board = Board::new();
        for (y, line) in lines.iter().enumerate() {
            let glyphs: Vec<char> = line.chars().collect();
            if glyphs.len() != BOARD_SIZE {
                return Err(ParseBoardError(format!(
                    "row {y} has {} cells, expected {BOARD_SIZE}",
                    glyphs.len()
                )));
            }
            for (x, &glyph) in glyphs.iter().enumerate() {
                board.cells[y][x] = match glyph {
                    '.' => None,
                    other => Some(Color::from_glyph(other).ok_or_else(|| {
                        ParseBoardError(format!("unknown glyph {other:?} at ({x}, {y})"))
                    })?),
                };
            }
        }
        Ok(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::{shape_named, SHAPES};

    fn full_board() -> Board {
        let mut board = Board::new();
        for row in board.cells.iter_mut() {
            row.fill(Some(Color::Pink));
        }
        board
    }

    #[test]
    fn test_can_place_on_empty_board() {
        let board = Board::new();
        for shape in &SHAPES {
            let max_x = (BOARD_SIZE - shape.width()) as i32;
            let max_y = (BOARD_SIZE - shape.height()) as i32;
            assert!(board.can_place(shape, Position::new(0, 0)));
            assert!(board.can_place(shape, Position::new(max_x, max_y)));
            assert!(
                !board.can_place(shape, Position::new(max_x + 1, max_y)),
                "{} should overflow the right edge",
                shape.name
            );
            assert!(
                !board.can_place(shape, Position::new(max_x, max_y + 1)),
                "{} should overflow the bottom edge",
                shape.name
            );
        }
    }

    #[test]
    fn test_can_place_rejects_negative_and_extreme_positions() {
        let board = Board::new();
        let monomino = shape_named("monomino").unwrap();
        assert!(!board.can_place(monomino, Position::new(-1, 0)));
        assert!(!board.can_place(monomino, Position::new(0, -1)));
        assert!(!board.can_place(monomino, Position::new(i32::MAX, 0)));
        assert!(!board.can_place(monomino, Position::new(8, 8)));
    }

    #[test]
    fn test_can_place_rejects_overlap_only_on_occupied_cells() {
        let mut board = Board::new();
        let square = shape_named("square").unwrap();
        board.place(shape_named("monomino").unwrap(), Color::Blue, Position::new(3, 3));

        assert!(!board.can_place(square, Position::new(2, 2)));
        assert!(!board.can_place(square, Position::new(3, 3)));
        assert!(board.can_place(square, Position::new(4, 4)));

        // the empty corner of an L may sit on an occupied cell
        let corner = shape_named("corner-ne").unwrap();
        assert!(board.can_place(corner, Position::new(2, 3)));
    }

    #[test]
    fn test_place_writes_only_occupied_cells() {
        let mut board = Board::new();
        let t = shape_named("t-down").unwrap();
        board.place(t, Color::Green, Position::new(1, 2));

        insta::assert_snapshot!(board.to_string(), @r"
        ........
        ........
        .GGG....
        ..G.....
        ........
        ........
        ........
        ........
        ");
        assert_eq!(board.filled_count(), 4);
    }

    #[test]
    fn test_scan_and_clear_row_and_column() {
        let mut board = Board::new();
        for i in 0..BOARD_SIZE {
            board.cells[3][i] = Some(Color::Orange);
            board.cells[i][5] = Some(Color::Purple);
        }
        board.cells[0][0] = Some(Color::Blue);
        board.cells[7][7] = Some(Color::Blue);
        assert_eq!(board.filled_count(), 17);

        let cleared = board.scan_and_clear();
        assert_eq!(cleared.count(), 2);
        assert_eq!(cleared.rows, 1 << 3);
        assert_eq!(cleared.columns, 1 << 5);
        assert_eq!(board.filled_count(), 2, "only the two stray cells survive");
        assert_eq!(board.cell(Position::new(0, 0)), Some(Color::Blue));
        assert_eq!(board.cell(Position::new(7, 7)), Some(Color::Blue));
    }

    #[test]
    fn test_scan_and_clear_full_board() {
        let mut board = full_board();
        let cleared = board.scan_and_clear();
        assert_eq!(cleared.count(), 16);
        assert!(board.is_empty());
    }

    #[test]
    fn test_scan_and_clear_ignores_incomplete_lines() {
        let mut board = full_board();
        board.cells[4][6] = None;
        let cleared = board.scan_and_clear();
        assert_eq!(cleared.count(), 14);
        assert_eq!(cleared.rows, !(1 << 4));
        assert_eq!(cleared.columns, !(1 << 6));
        // the row-4 and column-6 cells outside other lines are gone too,
        // because every other row and column was complete
        assert!(board.is_empty());
    }

    #[test]
    fn test_scan_and_clear_nothing_complete() {
        let mut board: Board = "
            OOOOOOO.
            ........
            ........
            ........
            ........
            ........
            ........
            B.......
        "
        .parse()
        .unwrap();
        let before = board;
        let cleared = board.scan_and_clear();
        assert!(cleared.is_empty());
        assert_eq!(board, before);
    }

    #[test]
    fn test_occupancy_bit_layout() {
        let mut board = Board::new();
        board.place(shape_named("monomino").unwrap(), Color::Pink, Position::new(2, 1));
        assert_eq!(board.occupancy(), 1 << (BOARD_SIZE + 2));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!("".parse::<Board>().is_err());
        let bad_glyph = "X.......\n".repeat(BOARD_SIZE);
        assert!(bad_glyph.parse::<Board>().is_err());
        let short_row = "....\n".repeat(BOARD_SIZE);
        assert!(short_row.parse::<Board>().is_err());
    }

    #[test]
    fn test_parse_display_agree() {
        let text = "OP......\n........\n...GG...\n........\n........\n........\n.......V\nB.......\n";
        let board: Board = text.parse().unwrap();
        assert_eq!(board.to_string(), text);
    }
}
