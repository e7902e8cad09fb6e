//! Outcome recording: counters, leaderboards, totals, and history.

use tracing::{debug, info, instrument, warn};

use super::GameService;
use crate::broadcast::Broadcast;
use crate::db::{GameOutcome, NewMatchRecord};
use crate::effects::SideEffect;
use crate::session::{PlayerId, SessionState};
use crate::store::LeaderboardId;

impl GameService {
    /// Concludes the current game and records it everywhere.
    ///
    /// In-memory counters are updated first and are never rolled back;
    /// every external write is best-effort. `forfeiter` is the player who
    /// left, if the game ended by disconnect.
    #[instrument(skip(self, state), fields(match_id = %state.match_id(), round = state.round()))]
    pub(super) fn finish_game(
        &mut self,
        state: &mut SessionState,
        winner: Option<PlayerId>,
        is_draw: bool,
        forfeiter: Option<&str>,
        now: i64,
    ) {
        state.conclude(winner.clone(), is_draw);

        let mut results = Vec::with_capacity(state.players().len());
        for player in state.players_mut() {
            let outcome = if is_draw {
                Some(GameOutcome::Draw)
            } else if winner.as_deref() == Some(player.user_id().as_str()) {
                player.record_win();
                Some(GameOutcome::Win)
            } else if winner.is_some() || forfeiter == Some(player.user_id().as_str()) {
                player.record_loss();
                Some(GameOutcome::Loss)
            } else {
                None
            };
            if let Some(outcome) = outcome {
                results.push((
                    player.user_id().clone(),
                    player.username().clone(),
                    *player.streak(),
                    outcome,
                ));
            }
        }

        for (user_id, username, streak, outcome) in &results {
            debug!(user_id = %user_id, outcome = outcome.to_db_string(), streak, "Counters updated");
            if *outcome == GameOutcome::Win {
                self.write_leaderboards(user_id, username, *streak, now);
            }
            if let Err(e) = self
                .collaborators
                .archive
                .record_player_result(user_id, *outcome)
            {
                self.effects.record(SideEffect::PlayerStats, &e, now);
            }
        }

        let loser = match (&winner, forfeiter) {
            (Some(w), _) => state.opponent_of(w).map(|p| p.user_id().clone()),
            (None, Some(f)) if !is_draw => Some(f.to_string()),
            _ => None,
        };
        self.write_history(state, winner, loser, now);

        self.broadcast(Broadcast::GameEnd(state.clone()));
    }

    fn write_leaderboards(&mut self, user_id: &str, username: &str, streak: u32, now: i64) {
        let leaderboard = &self.collaborators.leaderboard;
        match leaderboard.increment(LeaderboardId::GlobalWins, user_id, username, 1) {
            Ok(score) => info!(user_id, score, "Wins leaderboard updated"),
            Err(e) => self.effects.record(SideEffect::LeaderboardIncrement, &e, now),
        }
        match leaderboard.set_score(LeaderboardId::WinStreaks, user_id, username, i64::from(streak)) {
            Ok(score) => info!(user_id, score, "Streak leaderboard updated"),
            Err(e) => self.effects.record(SideEffect::LeaderboardSet, &e, now),
        }
    }

    fn write_history(
        &mut self,
        state: &SessionState,
        winner: Option<PlayerId>,
        loser: Option<PlayerId>,
        now: i64,
    ) {
        let duration = state
            .game_started_at()
            .map(|started| (now - started).max(0))
            .unwrap_or(0);
        let record = NewMatchRecord::new(
            state.match_id().clone(),
            i32::try_from(*state.round()).unwrap_or(i32::MAX),
            winner,
            loser,
            state.mode().to_string(),
            duration,
        );

        match self.collaborators.archive.record_match(&record) {
            Ok(true) => debug!(duration, "History row written"),
            Ok(false) => warn!("History row already present"),
            Err(e) => self.effects.record(SideEffect::MatchHistory, &e, now),
        }
    }
}
