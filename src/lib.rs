//! Color Blocks game engine.
//!
//! An 8x8 block-placement puzzle: the player drops polyomino pieces from a
//! pool of three onto the board, complete rows and columns clear for points,
//! and the game ends once no remaining piece fits. Rendering and input
//! handling belong to the embedding application; this crate owns the rules.
//!
//! ```
//! use color_blocks::engine::{GameSession, SessionConfig};
//! use color_blocks::generator::RandomPieces;
//! use color_blocks::persistence::NullReporter;
//!
//! let mut session = GameSession::new(
//!     SessionConfig::default(),
//!     Box::new(RandomPieces::seeded(42)),
//!     Box::new(NullReporter),
//! );
//! if let Some(hint) = session.hint() {
//!     let outcome = session.try_place(hint.piece_index, hint.position).unwrap();
//!     println!("cleared {} lines", outcome.lines_cleared);
//! }
//! ```

pub mod advisor;
pub mod engine;
pub mod generator;
pub mod grid;
pub mod persistence;
pub mod pieces;

pub use advisor::Hint;
pub use engine::{GameSession, PlaceError, PlaceOutcome, SessionConfig, SessionView};
pub use grid::{Board, Position};
pub use pieces::{Color, Piece, Pool, Shape};
