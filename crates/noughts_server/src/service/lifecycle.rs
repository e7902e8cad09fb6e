//! Seating, reconnects, and disconnect forfeits.

use tracing::{debug, info, instrument, warn};

use super::GameService;
use crate::broadcast::Broadcast;
use crate::messages::Presence;
use crate::session::{Player, SessionState};

impl GameService {
    /// Seats a player, or re-marks a returning one as connected.
    ///
    /// The first player gets X and the first turn; the second gets O and
    /// starts the game clock.
    #[instrument(skip(self, state, presence), fields(match_id = %state.match_id(), user_id = %presence.user_id))]
    pub fn join(&mut self, state: &mut SessionState, presence: &Presence, now: i64) {
        if let Some(player) = state.player_mut(&presence.user_id) {
            player.set_connected(true);
            info!(symbol = %player.symbol(), "Player reconnected");
            self.broadcast(Broadcast::StateUpdate(state.clone()));
            self.check_invariants(state);
            return;
        }

        if state.is_full() {
            warn!("Join beyond two players ignored");
            return;
        }

        let symbol = state.next_symbol();
        state.add_player(Player::new(
            presence.user_id.clone(),
            presence.username.clone(),
            symbol,
        ));
        info!(username = %presence.username, %symbol, "Player joined");

        if state.players().len() == 1 {
            state.assign_first_turn(presence.user_id.clone());
        }

        if state.is_full() {
            state.start_game(now);
            info!(starter = ?state.current_turn_id(), "Match ready, starting game");
            self.broadcast(Broadcast::StateUpdate(state.clone()));
        }
        self.check_invariants(state);
    }

    /// Marks a player disconnected.
    ///
    /// Leaving a full match mid-game forfeits it: the remaining connected
    /// player wins and the leaver takes the loss.
    #[instrument(skip(self, state), fields(match_id = %state.match_id()))]
    pub fn leave(&mut self, state: &mut SessionState, user_id: &str, now: i64) {
        let Some(player) = state.player_mut(user_id) else {
            debug!("Leave for unknown player ignored");
            return;
        };
        player.set_connected(false);
        info!(username = %player.username(), "Player left");

        if state.is_full() && !*state.game_over() {
            let winner = state
                .opponent_of(user_id)
                .filter(|p| *p.is_connected())
                .map(|p| p.user_id().clone());
            info!(winner = ?winner, "Forfeit");
            self.finish_game(state, winner, false, Some(user_id), now);
        } else {
            self.broadcast(Broadcast::StateUpdate(state.clone()));
        }
        self.check_invariants(state);
    }
}
