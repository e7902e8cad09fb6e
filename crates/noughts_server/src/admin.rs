//! Administrative operations: bans, leaderboards, and history lookups.

use derive_getters::Getters;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::db::{GameRepository, LeaderboardEntry, MatchRecord, PlayerStats, StoreError};
use crate::store::{Leaderboard, LeaderboardId};

/// One leaderboard with its ranked rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
pub struct LeaderboardView {
    board: LeaderboardId,
    entries: Vec<LeaderboardEntry>,
}

/// Service layer for operator tasks.
///
/// Wraps [`GameRepository`] with the operations exposed on the command
/// line.
#[derive(Debug, Clone)]
pub struct AdminService {
    repository: GameRepository,
}

impl AdminService {
    /// Creates an admin service backed by the given repository.
    #[instrument(skip(repository))]
    pub fn new(repository: GameRepository) -> Self {
        info!("Creating AdminService");
        Self { repository }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &GameRepository {
        &self.repository
    }

    /// Bans a user. Future join attempts are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the flag cannot be written.
    #[instrument(skip(self))]
    pub fn ban(&self, user_id: &str, reason: Option<String>) -> Result<(), StoreError> {
        self.repository.set_banned(user_id, true, reason)
    }

    /// Lifts a ban.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the flag cannot be written.
    #[instrument(skip(self))]
    pub fn unban(&self, user_id: &str) -> Result<(), StoreError> {
        self.repository.set_banned(user_id, false, None)
    }

    /// Top `limit` rows of both leaderboards, wins first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if either board cannot be read.
    #[instrument(skip(self))]
    pub fn leaderboards(&self, limit: usize) -> Result<Vec<LeaderboardView>, StoreError> {
        [LeaderboardId::GlobalWins, LeaderboardId::WinStreaks]
            .into_iter()
            .map(|board| {
                let entries = self.repository.top(board, limit)?;
                debug!(%board, count = entries.len(), "Leaderboard read");
                Ok::<_, StoreError>(LeaderboardView { board, entries })
            })
            .collect()
    }

    /// Recorded games of a match in round order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if history cannot be read.
    #[instrument(skip(self))]
    pub fn history(&self, match_id: &str) -> Result<Vec<MatchRecord>, StoreError> {
        self.repository.match_history(match_id)
    }

    /// Cumulative results of a user, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if stats cannot be read.
    #[instrument(skip(self))]
    pub fn stats(&self, user_id: &str) -> Result<Option<PlayerStats>, StoreError> {
        self.repository.player_stats(user_id)
    }
}
