//! Pure tic-tac-toe board model.
//!
//! Nine cells, two symbols, and the rules that decide a game. Nothing in
//! this crate knows about players, sessions, or persistence; the server
//! crate resolves symbols to the players who own them.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod position;
pub mod rules;
mod types;

pub use position::Position;
pub use rules::{LINES, Verdict, check_winner, evaluate, is_full, winning_symbols};
pub use types::{Board, ParseSquareError, Square, Symbol};

/// Number of cells on the board.
pub const BOARD_SIZE: usize = 9;
