//! Move validation.

use super::SessionState;
use noughts_board::Position;
use tracing::{debug, instrument};

/// Why a proposed move was refused.
///
/// Variants are listed in the order they are checked; the first that
/// applies is reported so clients always see the same message for the same
/// situation.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MoveRejection {
    /// The game has a result already.
    #[display("game has already ended")]
    GameOver,

    /// Someone else holds the turn.
    #[display("not your turn")]
    NotYourTurn,

    /// The mover is not seated in this match.
    #[display("player not in match")]
    UnknownPlayer,

    /// The position is outside 0-8.
    #[display("position out of bounds: {}", _0)]
    OutOfBounds(i64),

    /// The target cell is taken.
    #[display("position already occupied")]
    Occupied(Position),
}

impl std::error::Error for MoveRejection {}

/// Checks whether `user_id` may play at `position`. Never mutates.
#[instrument(skip(state), fields(match_id = %state.match_id()))]
pub fn validate_move(
    state: &SessionState,
    user_id: &str,
    position: i64,
) -> Result<Position, MoveRejection> {
    if *state.game_over() {
        return Err(MoveRejection::GameOver);
    }

    if state.current_turn_id().as_deref() != Some(user_id) {
        debug!(expected = ?state.current_turn_id(), "Move out of turn");
        return Err(MoveRejection::NotYourTurn);
    }

    if state.player(user_id).is_none() {
        return Err(MoveRejection::UnknownPlayer);
    }

    let pos = Position::from_wire(position).ok_or(MoveRejection::OutOfBounds(position))?;

    if !state.board().is_empty(pos) {
        return Err(MoveRejection::Occupied(pos));
    }

    Ok(pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{GameMode, Player};
    use noughts_board::Symbol;

    fn in_play() -> SessionState {
        let mut state = SessionState::new("m1".into(), GameMode::Classic, 30, None);
        state.add_player(Player::new("a".into(), "Alice".into(), Symbol::X));
        state.add_player(Player::new("b".into(), "Bob".into(), Symbol::O));
        state.assign_first_turn("a".into());
        state.start_game(100);
        state
    }

    #[test]
    fn test_accepts_turn_holder_on_empty_cell() {
        assert_eq!(validate_move(&in_play(), "a", 4), Ok(Position::Center));
    }

    #[test]
    fn test_game_over_reported_before_turn() {
        let mut state = in_play();
        state.conclude(Some("a".into()), false);
        assert_eq!(validate_move(&state, "b", 99), Err(MoveRejection::GameOver));
        assert_eq!(
            validate_move(&state, "b", 99).unwrap_err().to_string(),
            "game has already ended"
        );
    }

    #[test]
    fn test_turn_reported_before_seat_and_bounds() {
        let state = in_play();
        assert_eq!(
            validate_move(&state, "stranger", 99),
            Err(MoveRejection::NotYourTurn)
        );
        assert_eq!(validate_move(&state, "b", -1), Err(MoveRejection::NotYourTurn));
    }

    #[test]
    fn test_unseated_turn_holder_reported_before_bounds() {
        let mut state = in_play();
        state.assign_first_turn("ghost".into());
        assert_eq!(
            validate_move(&state, "ghost", 99),
            Err(MoveRejection::UnknownPlayer)
        );
    }

    #[test]
    fn test_out_of_bounds() {
        let state = in_play();
        let result = validate_move(&state, "a", -1);
        assert_eq!(result, Err(MoveRejection::OutOfBounds(-1)));
        assert_eq!(result.unwrap_err().to_string(), "position out of bounds: -1");
        assert_eq!(validate_move(&state, "a", 9), Err(MoveRejection::OutOfBounds(9)));
    }

    #[test]
    fn test_occupied_cell() {
        let mut state = in_play();
        state.place(Position::Center, Symbol::O);
        let result = validate_move(&state, "a", 4);
        assert_eq!(result, Err(MoveRejection::Occupied(Position::Center)));
        assert_eq!(result.unwrap_err().to_string(), "position already occupied");
    }
}
