//! Shape catalog, color palette and piece definitions.
//!
//! Each shape is a rectangular 0/1 matrix. Its top-left corner is the
//! anchor used when the shape is placed on the board.

use std::fmt;

use serde::Serialize;

use crate::grid::BOARD_SIZE;

/// Number of pieces offered to the player at a time.
pub const POOL_SIZE: usize = 3;

/// Presentation color of an empty board cell.
pub const EMPTY_HEX: &str = "#2E2A3C";

/// An immutable polyomino footprint.
#[derive(Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Shape {
    pub name: &'static str,
    rows: &'static [&'static [u8]],
}

impl Shape {
    /// Creates a shape with compile-time validation.
    ///
    /// The matrix must be rectangular, contain only 0 and 1, fit the board,
    /// and be tight: every edge of the bounding box carries an occupied cell.
    pub const fn new(name: &'static str, rows: &'static [&'static [u8]]) -> Self {
        assert!(!rows.is_empty(), "shape needs at least one row");
        let height = rows.len();
        let width = rows[0].len();
        assert!(width > 0, "shape needs at least one column");
        assert!(
            height <= BOARD_SIZE && width <= BOARD_SIZE,
            "shape must fit the board"
        );

        let mut top = false;
        let mut bottom = false;
        let mut left = false;
        let mut right = false;
        let mut y = 0;
        while y < height {
            assert!(rows[y].len() == width, "shape rows must be rectangular");
            let mut x = 0;
            while x < width {
                assert!(rows[y][x] <= 1, "shape cells must be 0 or 1");
                if rows[y][x] == 1 {
                    top |= y == 0;
                    bottom |= y == height - 1;
                    left |= x == 0;
                    right |= x == width - 1;
                }
                x += 1;
            }
            y += 1;
        }
        assert!(top && bottom && left && right, "shape must be tight");

        Self { name, rows }
    }

    #[inline]
    pub const fn width(&self) -> usize {
        self.rows[0].len()
    }

    #[inline]
    pub const fn height(&self) -> usize {
        self.rows.len()
    }

    /// Occupied `(dx, dy)` offsets in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().enumerate().flat_map(|(dy, row)| {
            row.iter()
                .enumerate()
                .filter(|&(_, &cell)| cell == 1)
                .map(move |(dx, _)| (dx, dy))
        })
    }

    /// Number of occupied cells.
    pub fn size(&self) -> usize {
        self.cells().count()
    }

    /// Occupancy bitmask anchored at the board origin.
    ///
    /// Bit `y * BOARD_SIZE + x` is set for every occupied cell, so shifting
    /// the mask by `y * BOARD_SIZE + x` anchors the shape at `(x, y)`.
    pub const fn mask(&self) -> u64 {
        let mut mask = 0u64;
        let mut y = 0;
        while y < self.rows.len() {
            let mut x = 0;
            while x < self.rows[y].len() {
                if self.rows[y][x] == 1 {
                    mask |= 1u64 << (y * BOARD_SIZE + x);
                }
                x += 1;
            }
            y += 1;
        }
        mask
    }
}

/// The fixed shape catalog pieces are drawn from.
pub static SHAPES: [Shape; 16] = [
    Shape::new("monomino", &[&[1]]),
    // dominoes
    Shape::new("domino-v", &[&[1], &[1]]),
    Shape::new("domino-h", &[&[1, 1]]),
    // L-trominoes, one per missing corner
    Shape::new("corner-ne", &[&[1, 0], &[1, 1]]),
    Shape::new("corner-se", &[&[1, 1], &[1, 0]]),
    Shape::new("corner-nw", &[&[0, 1], &[1, 1]]),
    Shape::new("corner-sw", &[&[1, 1], &[0, 1]]),
    Shape::new("square", &[&[1, 1], &[1, 1]]),
    // bars
    Shape::new("bar-h", &[&[1, 1, 1]]),
    Shape::new("bar-v", &[&[1], &[1], &[1]]),
    // Z tetrominoes
    Shape::new("z-h", &[&[1, 1, 0], &[0, 1, 1]]),
    Shape::new("z-v", &[&[0, 1], &[1, 1], &[1, 0]]),
    // T tetrominoes, named after the direction of the stem
    Shape::new("t-down", &[&[1, 1, 1], &[0, 1, 0]]),
    Shape::new("t-left", &[&[0, 1], &[1, 1], &[0, 1]]),
    Shape::new("t-up", &[&[0, 1, 0], &[1, 1, 1]]),
    Shape::new("t-right", &[&[1, 0], &[1, 1], &[1, 0]]),
];

/// Looks up a catalog shape by name.
pub fn shape_named(name: &str) -> Option<&'static Shape> {
    SHAPES.iter().find(|shape| shape.name == name)
}

/// The block palette. Empty cells are not a color; they are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Orange,
    Pink,
    Green,
    Purple,
    Blue,
}

impl Color {
    pub const ALL: [Color; 5] = [
        Color::Orange,
        Color::Pink,
        Color::Green,
        Color::Purple,
        Color::Blue,
    ];

    /// Presentation hex value for UI layers.
    pub const fn hex(self) -> &'static str {
        match self {
            Color::Orange => "#FF8C00",
            Color::Pink => "#FF1493",
            Color::Green => "#32CD32",
            Color::Purple => "#9932CC",
            Color::Blue => "#1E90FF",
        }
    }

    /// Single-character rendering used by the text board.
    pub const fn glyph(self) -> char {
        match self {
            Color::Orange => 'O',
            Color::Pink => 'P',
            Color::Green => 'G',
            Color::Purple => 'V',
            Color::Blue => 'B',
        }
    }

    pub fn from_glyph(glyph: char) -> Option<Color> {
        Color::ALL.into_iter().find(|color| color.glyph() == glyph)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Color::Orange => "orange",
            Color::Pink => "pink",
            Color::Green => "green",
            Color::Purple => "purple",
            Color::Blue => "blue",
        };
        f.write_str(name)
    }
}

/// A shape and color offered in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Piece {
    pub shape: &'static Shape,
    pub color: Color,
    pub placed: bool,
}

impl Piece {
    pub const fn new(shape: &'static Shape, color: Color) -> Self {
        Self {
            shape,
            color,
            placed: false,
        }
    }
}

/// Renders the shape matrix with the piece's color glyph.
impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.shape.rows {
            for &cell in *row {
                let glyph = if cell == 1 { self.color.glyph() } else { '.' };
                write!(f, "{glyph}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// The pieces currently offered to the player.
pub type Pool = [Piece; POOL_SIZE];

/// True once every piece in the pool has been placed.
pub fn all_placed(pool: &Pool) -> bool {
    pool.iter().all(|piece| piece.placed)
}
