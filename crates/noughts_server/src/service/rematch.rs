//! Post-game rematch negotiation.

use tracing::{info, instrument};

use super::{GameService, SignalError};
use crate::broadcast::Broadcast;
use crate::session::{MAX_PLAYERS, SessionState};

/// Where a rematch stands after a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
pub enum RematchStatus {
    /// Other connected players have not asked yet.
    #[strum(serialize = "rematch_requested")]
    Requested,
    /// Everyone connected asked, but a seat is empty or disconnected.
    #[strum(serialize = "waiting_for_players")]
    WaitingForPlayers,
    /// A new game has started.
    #[strum(serialize = "rematch_accepted")]
    Accepted,
}

impl GameService {
    /// Records a rematch request and starts a new game once every
    /// connected player has asked and both are connected.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError`] while the game is still running or when the
    /// requester is unknown or disconnected.
    #[instrument(skip(self, state), fields(match_id = %state.match_id()))]
    pub fn request_rematch(
        &mut self,
        state: &mut SessionState,
        user_id: &str,
        now: i64,
    ) -> Result<RematchStatus, SignalError> {
        if !*state.game_over() {
            info!("Rematch rejected, game not over");
            return Err(SignalError::GameInProgress);
        }
        match state.player(user_id) {
            None => return Err(SignalError::PlayerNotFound),
            Some(player) if !*player.is_connected() => {
                return Err(SignalError::PlayerNotConnected);
            }
            Some(_) => {}
        }

        state.record_rematch_request(user_id);
        let requested = state.connected_requesters();
        let connected = state.connected_count();
        info!(requested, connected, "Rematch requested");

        let status = if requested < connected {
            RematchStatus::Requested
        } else if connected < MAX_PLAYERS {
            RematchStatus::WaitingForPlayers
        } else {
            state.reset_for_rematch(now);
            info!(round = state.round(), starter = ?state.current_turn_id(), "Rematch accepted, new game started");
            RematchStatus::Accepted
        };

        self.broadcast(Broadcast::StateUpdate(state.clone()));
        self.check_invariants(state);
        Ok(status)
    }
}
