//! Core board types.

use crate::{BOARD_SIZE, Position};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// One of the two marks a player places on the board.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum Symbol {
    /// Assigned to the first player to join.
    X,
    /// Assigned to the second player to join.
    O,
}

impl Symbol {
    /// Returns the other symbol.
    pub fn opponent(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }
}

/// A cell on the board.
///
/// Serialized as `""` when empty and `"X"` / `"O"` when occupied, which is
/// the shape clients receive inside state snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Square {
    /// Nobody has played here.
    #[default]
    Empty,
    /// Holds a symbol.
    Occupied(Symbol),
}

impl Square {
    /// Returns the symbol in this cell, if any.
    pub fn symbol(self) -> Option<Symbol> {
        match self {
            Square::Empty => None,
            Square::Occupied(symbol) => Some(symbol),
        }
    }
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        match square {
            Square::Empty => String::new(),
            Square::Occupied(symbol) => symbol.to_string(),
        }
    }
}

/// A cell string that is neither empty nor a known symbol.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("Invalid cell value: '{}'", _0)]
pub struct ParseSquareError(pub String);

impl std::error::Error for ParseSquareError {}

impl TryFrom<String> for Square {
    type Error = ParseSquareError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Ok(Square::Empty);
        }
        value
            .parse::<Symbol>()
            .map(Square::Occupied)
            .map_err(|_| ParseSquareError(value))
    }
}

/// 3x3 board stored in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    squares: [Square; BOARD_SIZE],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self {
            squares: [Square::Empty; BOARD_SIZE],
        }
    }

    /// Returns the square at the given position.
    pub fn get(&self, pos: Position) -> Square {
        self.squares[pos.to_index()]
    }

    /// Overwrites the square at the given position.
    pub fn set(&mut self, pos: Position, square: Square) {
        self.squares[pos.to_index()] = square;
    }

    /// Checks if the square at the given position is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos) == Square::Empty
    }

    /// Returns all squares.
    pub fn squares(&self) -> &[Square; BOARD_SIZE] {
        &self.squares
    }

    /// Number of occupied cells.
    pub fn occupied_count(&self) -> usize {
        self.squares.iter().filter(|s| **s != Square::Empty).count()
    }

    /// Lowest-index empty position, scanning 0 through 8.
    #[instrument(skip(self))]
    pub fn first_empty(&self) -> Option<Position> {
        Position::ALL.into_iter().find(|pos| self.is_empty(*pos))
    }

    /// Empties every cell.
    pub fn clear(&mut self) {
        self.squares = [Square::Empty; BOARD_SIZE];
    }

    /// Formats the board as a human-readable grid.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let pos = row * 3 + col;
                let symbol = match self.squares[pos] {
                    Square::Empty => pos.to_string(),
                    Square::Occupied(symbol) => symbol.to_string(),
                };
                result.push_str(&symbol);
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_serializes_as_plain_string() {
        let mut board = Board::new();
        board.set(Position::TopLeft, Square::Occupied(Symbol::X));
        board.set(Position::Center, Square::Occupied(Symbol::O));

        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(json, r#"["X","","","","O","","","",""]"#);

        let back: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(back, board);
    }

    #[test]
    fn test_square_rejects_unknown_symbol() {
        let result: Result<Square, _> = serde_json::from_str(r#""Z""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_first_empty_scans_in_index_order() {
        let mut board = Board::new();
        assert_eq!(board.first_empty(), Some(Position::TopLeft));

        board.set(Position::TopLeft, Square::Occupied(Symbol::X));
        board.set(Position::TopCenter, Square::Occupied(Symbol::O));
        assert_eq!(board.first_empty(), Some(Position::TopRight));
    }

    #[test]
    fn test_clear_resets_every_cell() {
        let mut board = Board::new();
        board.set(Position::BottomRight, Square::Occupied(Symbol::O));
        assert_eq!(board.occupied_count(), 1);

        board.clear();
        assert_eq!(board.occupied_count(), 0);
        assert_eq!(board, Board::new());
    }

    #[test]
    fn test_display_grid() {
        let mut board = Board::new();
        board.set(Position::Center, Square::Occupied(Symbol::X));
        assert_eq!(board.display(), "0|1|2\n-+-+-\n3|X|5\n-+-+-\n6|7|8");
    }
}
