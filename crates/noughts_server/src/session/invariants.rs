//! Session invariants.
//!
//! Properties that must hold after every transition. The game service checks
//! them after each mutation and logs any violation as an internal
//! inconsistency; the session keeps running in its current state.

use super::SessionState;

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("invariant violated: {}", description)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants checked together. Implemented for tuples.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

macro_rules! impl_invariant_set {
    ($($inv:ident),+) => {
        impl<S, $($inv),+> InvariantSet<S> for ($($inv,)+)
        where
            $($inv: Invariant<S>),+
        {
            fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
                let mut violations = Vec::new();
                $(
                    if !$inv::holds(state) {
                        violations.push(InvariantViolation::new($inv::description()));
                    }
                )+
                if violations.is_empty() {
                    Ok(())
                } else {
                    Err(violations)
                }
            }
        }
    };
}

impl_invariant_set!(I1, I2);
impl_invariant_set!(I1, I2, I3);
impl_invariant_set!(I1, I2, I3, I4);

/// Move count equals the number of occupied cells.
pub struct MoveCountMatchesBoard;

impl Invariant<SessionState> for MoveCountMatchesBoard {
    fn holds(state: &SessionState) -> bool {
        *state.move_count() as usize == state.board().occupied_count()
    }

    fn description() -> &'static str {
        "Move count equals the number of occupied cells"
    }
}

/// Winner and draw are mutually exclusive, and both are unset during play.
pub struct ExclusiveOutcome;

impl Invariant<SessionState> for ExclusiveOutcome {
    fn holds(state: &SessionState) -> bool {
        if *state.game_over() {
            !(state.winner().is_some() && *state.is_draw())
        } else {
            state.winner().is_none() && !*state.is_draw()
        }
    }

    fn description() -> &'static str {
        "Winner and draw are exclusive, and unset while the game is in progress"
    }
}

/// The turn holder, when set, is a seated player.
pub struct TurnHolderSeated;

impl Invariant<SessionState> for TurnHolderSeated {
    fn holds(state: &SessionState) -> bool {
        state
            .current_turn_id()
            .as_deref()
            .is_none_or(|id| state.player(id).is_some())
    }

    fn description() -> &'static str {
        "Turn holder is a seated player"
    }
}

/// No rematch requests linger while a game is being played.
pub struct NoRematchDuringPlay;

impl Invariant<SessionState> for NoRematchDuringPlay {
    fn holds(state: &SessionState) -> bool {
        *state.game_over() || state.rematch_requests().is_empty()
    }

    fn description() -> &'static str {
        "Rematch requests are empty while the game is in progress"
    }
}

/// Every session invariant as a composable set.
pub type SessionInvariants = (
    MoveCountMatchesBoard,
    ExclusiveOutcome,
    TurnHolderSeated,
    NoRematchDuringPlay,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{GameMode, Player};
    use noughts_board::{Position, Symbol};

    fn seated() -> SessionState {
        let mut state = SessionState::new("m1".into(), GameMode::Classic, 30, None);
        state.add_player(Player::new("a".into(), "Alice".into(), Symbol::X));
        state.add_player(Player::new("b".into(), "Bob".into(), Symbol::O));
        state.assign_first_turn("a".into());
        state.start_game(100);
        state
    }

    #[test]
    fn test_invariant_set_holds_for_fresh_session() {
        let state = SessionState::new("m1".into(), GameMode::Timed, 30, Some(50));
        assert!(SessionInvariants::check_all(&state).is_ok());
    }

    #[test]
    fn test_invariant_set_holds_after_place() {
        let mut state = seated();
        state.place(Position::Center, Symbol::X);
        state.pass_turn(101);
        assert!(SessionInvariants::check_all(&state).is_ok());
    }

    #[test]
    fn test_detects_board_written_without_move() {
        let mut snapshot = serde_json::to_value(seated()).unwrap();
        snapshot["board"][0] = serde_json::json!("O");
        let corrupted: SessionState = serde_json::from_value(snapshot).unwrap();

        let violations = SessionInvariants::check_all(&corrupted).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].description,
            MoveCountMatchesBoard::description()
        );
    }

    #[test]
    fn test_detects_winner_and_draw_together() {
        let mut state = seated();
        state.conclude(Some("a".into()), true);
        assert!(!ExclusiveOutcome::holds(&state));
    }

    #[test]
    fn test_detects_unseated_turn_holder() {
        let mut state = seated();
        state.assign_first_turn("ghost".into());
        assert!(!TurnHolderSeated::holds(&state));
    }

    #[test]
    fn test_two_invariants_as_set() {
        type TwoInvariants = (MoveCountMatchesBoard, TurnHolderSeated);
        assert!(TwoInvariants::check_all(&seated()).is_ok());
    }
}
