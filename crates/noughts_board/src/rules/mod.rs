//! Game rules.
//!
//! Pure functions over a [`Board`]. They never mutate and never fail; the
//! server decides what a verdict means for the players holding each symbol.

pub mod draw;
pub mod win;

pub use draw::is_full;
pub use win::{LINES, check_winner, winning_symbols};

use crate::Board;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Result of evaluating a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// A line is complete for this symbol.
    Won(crate::Symbol),
    /// Every cell is occupied and no line is complete.
    Draw,
    /// Play continues.
    Undecided,
}

impl Verdict {
    /// True for [`Verdict::Won`] and [`Verdict::Draw`].
    pub fn is_concluded(&self) -> bool {
        !matches!(self, Verdict::Undecided)
    }
}

/// Evaluates a board: first completed line wins, otherwise a full board
/// draws.
#[instrument(skip(board))]
pub fn evaluate(board: &Board) -> Verdict {
    if let Some(symbol) = check_winner(board) {
        Verdict::Won(symbol)
    } else if is_full(board) {
        Verdict::Draw
    } else {
        Verdict::Undecided
    }
}
