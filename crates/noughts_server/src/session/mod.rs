//! Session state, move validation, and outcome evaluation.

mod invariants;
mod outcome;
mod state;
mod validator;

pub use invariants::{
    ExclusiveOutcome, Invariant, InvariantSet, InvariantViolation, MoveCountMatchesBoard,
    NoRematchDuringPlay, SessionInvariants, TurnHolderSeated,
};
pub use outcome::{Evaluation, evaluate};
pub use state::{GameMode, MAX_PLAYERS, MatchId, Player, PlayerId, SessionState};
pub use validator::{MoveRejection, validate_move};
