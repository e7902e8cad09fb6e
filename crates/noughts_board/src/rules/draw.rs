//! Draw detection.

use crate::{BOARD_SIZE, Board};

/// Checks if every cell is occupied.
///
/// A full board with no completed line is a draw.
pub fn is_full(board: &Board) -> bool {
    board.occupied_count() == BOARD_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Position, Square, Symbol};

    #[test]
    fn test_empty_board_not_full() {
        assert!(!is_full(&Board::new()));
    }

    #[test]
    fn test_partial_board_not_full() {
        let mut board = Board::new();
        board.set(Position::Center, Square::Occupied(Symbol::X));
        assert!(!is_full(&board));
    }

    #[test]
    fn test_full_board() {
        let mut board = Board::new();
        for pos in Position::ALL {
            board.set(pos, Square::Occupied(Symbol::O));
        }
        assert!(is_full(&board));
    }
}
