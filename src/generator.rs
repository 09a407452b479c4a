//! Piece sources that feed the pool.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::pieces::{Color, Piece, Pool, SHAPES};

/// Supplies new pieces whenever the pool is refilled.
pub trait PieceSource {
    fn next_piece(&mut self) -> Piece;

    /// Draws a fresh pool of independent, unplaced pieces.
    fn generate_pool(&mut self) -> Pool {
        [self.next_piece(), self.next_piece(), self.next_piece()]
    }
}

/// Uniform draws: any catalog shape, independently any palette color.
pub struct RandomPieces {
    rng: SmallRng,
}

impl RandomPieces {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }

    /// Reproducible stream for a given seed, on one platform and `rand` version.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPieces {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceSource for RandomPieces {
    fn next_piece(&mut self) -> Piece {
        let shape = &SHAPES[self.rng.random_range(0..SHAPES.len())];
        let color = Color::ALL[self.rng.random_range(0..Color::ALL.len())];
        Piece::new(shape, color)
    }
}

/// Replays a fixed list of pieces in order, wrapping around at the end.
///
/// An empty list yields orange monominoes.
pub struct ScriptedPieces {
    pieces: Vec<Piece>,
    next: usize,
}

impl ScriptedPieces {
    pub fn new(pieces: Vec<Piece>) -> Self {
        Self { pieces, next: 0 }
    }
}

impl PieceSource for ScriptedPieces {
    fn next_piece(&mut self) -> Piece {
        if self.pieces.is_empty() {
            return Piece::new(&SHAPES[0], Color::Orange);
        }
        let mut piece = self.pieces[self.next % self.pieces.len()];
        piece.placed = false;
        self.next += 1;
        piece
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::shape_named;

    #[test]
    fn test_random_pool_is_unplaced() {
        let mut source = RandomPieces::seeded(7);
        for _ in 0..50 {
            let pool = source.generate_pool();
            assert!(pool.iter().all(|piece| !piece.placed));
        }
    }

    #[test]
    fn test_seeded_sources_repeat() {
        let mut a = RandomPieces::seeded(42);
        let mut b = RandomPieces::seeded(42);
        for _ in 0..20 {
            assert_eq!(a.generate_pool(), b.generate_pool());
        }
    }

    #[test]
    fn test_random_draws_cover_catalog_and_palette() {
        let mut source = RandomPieces::seeded(1);
        let mut shapes_seen = [false; 16];
        let mut colors_seen = [false; 5];
        for _ in 0..2_000 {
            let piece = source.next_piece();
            let shape_index = SHAPES
                .iter()
                .position(|shape| shape == piece.shape)
                .expect("piece shape must come from the catalog");
            let color_index = Color::ALL.iter().position(|&c| c == piece.color).unwrap();
            shapes_seen[shape_index] = true;
            colors_seen[color_index] = true;
        }
        assert!(shapes_seen.iter().all(|&seen| seen), "every shape should be drawn");
        assert!(colors_seen.iter().all(|&seen| seen), "every color should be drawn");
    }

    #[test]
    fn test_scripted_pieces_wrap_and_reset_placed() {
        let mut first = Piece::new(shape_named("square").unwrap(), Color::Pink);
        first.placed = true;
        let second = Piece::new(shape_named("bar-h").unwrap(), Color::Blue);
        let mut source = ScriptedPieces::new(vec![first, second]);

        let pool = source.generate_pool();
        assert_eq!(pool[0].shape.name, "square");
        assert!(!pool[0].placed, "scripted pieces always arrive unplaced");
        assert_eq!(pool[1].shape.name, "bar-h");
        assert_eq!(pool[2].shape.name, "square");
    }

    #[test]
    fn test_empty_script_falls_back_to_monomino() {
        let mut source = ScriptedPieces::new(Vec::new());
        assert_eq!(source.next_piece().shape.name, "monomino");
    }
}
