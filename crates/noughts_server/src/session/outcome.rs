//! Resolves board verdicts to players.

use super::{PlayerId, SessionState};
use noughts_board::{Verdict, is_full, winning_symbols};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

/// Outcome of evaluating a session's board.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Evaluation {
    /// Owner of the first completed line.
    pub winner: Option<PlayerId>,
    /// Full board with no completed line.
    pub is_draw: bool,
}

impl Evaluation {
    /// True when the game has a result.
    pub fn is_concluded(&self) -> bool {
        self.winner.is_some() || self.is_draw
    }
}

/// Evaluates the board and resolves the winning symbol to its player.
///
/// Lines are checked in fixed order (rows, columns, diagonals) and the
/// first line whose symbol belongs to a seated player decides the game.
#[instrument(skip(state), fields(match_id = %state.match_id()))]
pub fn evaluate(state: &SessionState) -> Evaluation {
    match noughts_board::evaluate(state.board()) {
        Verdict::Undecided => Evaluation::default(),
        Verdict::Draw => Evaluation {
            winner: None,
            is_draw: true,
        },
        Verdict::Won(_) => {
            for symbol in winning_symbols(state.board()) {
                match state.player_by_symbol(symbol) {
                    Some(player) => {
                        return Evaluation {
                            winner: Some(player.user_id().clone()),
                            is_draw: false,
                        };
                    }
                    None => warn!(%symbol, "Completed line has no owning player"),
                }
            }
            Evaluation {
                winner: None,
                is_draw: is_full(state.board()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{GameMode, Player};
    use noughts_board::{Position, Symbol};

    fn seated() -> SessionState {
        let mut state = SessionState::new("m1".into(), GameMode::Classic, 30, None);
        state.add_player(Player::new("a".into(), "Alice".into(), Symbol::X));
        state.add_player(Player::new("b".into(), "Bob".into(), Symbol::O));
        state
    }

    #[test]
    fn test_open_board_has_no_result() {
        let mut state = seated();
        state.place(Position::Center, Symbol::X);
        assert_eq!(evaluate(&state), Evaluation::default());
        assert!(!evaluate(&state).is_concluded());
    }

    #[test]
    fn test_line_resolves_to_owner() {
        let mut state = seated();
        for pos in [Position::TopRight, Position::Center, Position::BottomLeft] {
            state.place(pos, Symbol::O);
        }
        let result = evaluate(&state);
        assert_eq!(result.winner.as_deref(), Some("b"));
        assert!(!result.is_draw);
    }

    #[test]
    fn test_unowned_line_is_skipped() {
        let mut state = SessionState::new("m1".into(), GameMode::Classic, 30, None);
        state.add_player(Player::new("a".into(), "Alice".into(), Symbol::X));
        for pos in [Position::MiddleLeft, Position::Center, Position::MiddleRight] {
            state.place(pos, Symbol::O);
        }
        assert_eq!(evaluate(&state), Evaluation::default());
    }

    #[test]
    fn test_full_board_without_line_draws() {
        let mut state = seated();
        // X O X / X O O / O X X
        let symbols = [
            Symbol::X,
            Symbol::O,
            Symbol::X,
            Symbol::X,
            Symbol::O,
            Symbol::O,
            Symbol::O,
            Symbol::X,
            Symbol::X,
        ];
        for (pos, symbol) in Position::ALL.into_iter().zip(symbols) {
            state.place(pos, symbol);
        }
        let result = evaluate(&state);
        assert_eq!(result.winner, None);
        assert!(result.is_draw);
    }
}
