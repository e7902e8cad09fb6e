//! Moves and turn timeouts.

use noughts_board::{Position, Symbol};
use tracing::{debug, error, info, instrument, warn};

use super::GameService;
use crate::broadcast::Broadcast;
use crate::session::{MoveRejection, SessionState, evaluate, validate_move};

impl GameService {
    /// Applies a move from `user_id` at the raw board index `position`.
    ///
    /// # Errors
    ///
    /// Returns the [`MoveRejection`] reason when the move is invalid; the
    /// state is untouched in that case.
    #[instrument(skip(self, state), fields(match_id = %state.match_id()))]
    pub fn process_move(
        &mut self,
        state: &mut SessionState,
        user_id: &str,
        position: i64,
        now: i64,
    ) -> Result<(), MoveRejection> {
        let pos = validate_move(state, user_id, position)?;
        let symbol = state
            .player(user_id)
            .map(|p| *p.symbol())
            .ok_or(MoveRejection::UnknownPlayer)?;

        self.apply_move(state, pos, symbol, now);
        Ok(())
    }

    /// Plays the lowest empty square for a player who ran out of time.
    ///
    /// Returns whether an automatic move was made. Only timed matches with
    /// both players seated and the clock running can time out.
    #[instrument(skip(self, state), fields(match_id = %state.match_id()))]
    pub fn check_timeout(&mut self, state: &mut SessionState, now: i64) -> bool {
        if *state.game_over() || !state.is_full() || !state.is_timed_out(now) {
            return false;
        }

        let Some(symbol) = state
            .current_turn_id()
            .as_deref()
            .and_then(|id| state.player(id))
            .map(|p| *p.symbol())
        else {
            warn!("Timed out with no turn holder");
            return false;
        };

        let Some(pos) = state.board().first_empty() else {
            error!("Turn timed out on a full board, no automatic move possible");
            return false;
        };

        info!(turn = ?state.current_turn_id(), %symbol, position = pos.to_index(), "Turn timed out, playing automatic move");
        self.broadcast(Broadcast::Timeout(state.clone()));
        self.apply_move(state, pos, symbol, now);
        true
    }

    /// Places an already validated move, then concludes the game or passes
    /// the turn.
    fn apply_move(&mut self, state: &mut SessionState, pos: Position, symbol: Symbol, now: i64) {
        state.place(pos, symbol);
        debug!(%symbol, position = pos.to_index(), move_count = state.move_count(), "Move placed");

        let evaluation = evaluate(state);
        if evaluation.is_concluded() {
            info!(winner = ?evaluation.winner, is_draw = evaluation.is_draw, "Game concluded");
            self.finish_game(state, evaluation.winner, evaluation.is_draw, None, now);
        } else {
            state.pass_turn(now);
            self.broadcast(Broadcast::StateUpdate(state.clone()));
        }
        self.check_invariants(state);
    }
}
