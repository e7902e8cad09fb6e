//! Win detection.

use crate::{Board, Position, Square, Symbol};
use tracing::instrument;

/// Every three-in-a-row line, in evaluation order: rows, columns, diagonals.
pub const LINES: [[Position; 3]; 8] = [
    // Rows
    [Position::TopLeft, Position::TopCenter, Position::TopRight],
    [Position::MiddleLeft, Position::Center, Position::MiddleRight],
    [Position::BottomLeft, Position::BottomCenter, Position::BottomRight],
    // Columns
    [Position::TopLeft, Position::MiddleLeft, Position::BottomLeft],
    [Position::TopCenter, Position::Center, Position::BottomCenter],
    [Position::TopRight, Position::MiddleRight, Position::BottomRight],
    // Diagonals
    [Position::TopLeft, Position::Center, Position::BottomRight],
    [Position::TopRight, Position::Center, Position::BottomLeft],
];

/// Symbols of every completed line, in [`LINES`] order.
///
/// A symbol appears once per line it completes.
pub fn winning_symbols(board: &Board) -> impl Iterator<Item = Symbol> + '_ {
    LINES.iter().filter_map(move |&[a, b, c]| {
        let sq = board.get(a);
        if sq != Square::Empty && sq == board.get(b) && sq == board.get(c) {
            sq.symbol()
        } else {
            None
        }
    })
}

/// Returns the symbol of the first completed line, if any.
#[instrument(skip(board))]
pub fn check_winner(board: &Board) -> Option<Symbol> {
    winning_symbols(board).next()
}
