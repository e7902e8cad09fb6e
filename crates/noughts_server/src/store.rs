//! Persistence collaborators the game service talks to.
//!
//! Each trait is shared by every match on the server, so implementations
//! must be safe to call from many sessions at once.

use crate::db::{GameOutcome, LeaderboardEntry, NewChatMessage, NewMatchRecord, StoreError};
use serde::{Deserialize, Serialize};

/// The two ranked boards the server maintains.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaderboardId {
    /// Total games won; incremented on every win.
    GlobalWins,
    /// Current consecutive-win streak; overwritten on every win.
    WinStreaks,
}

/// Keyed lookup of banned users.
pub trait BanList: Send + Sync {
    /// Returns whether `user_id` is banned. Unknown users are not banned.
    fn is_banned(&self, user_id: &str) -> Result<bool, StoreError>;
}

/// Ranked score store.
pub trait Leaderboard: Send + Sync {
    /// Adds `delta` to the owner's score, creating the record at `delta`.
    /// Returns the new score.
    fn increment(
        &self,
        board: LeaderboardId,
        owner_id: &str,
        username: &str,
        delta: i64,
    ) -> Result<i64, StoreError>;

    /// Overwrites the owner's score. Returns the stored score.
    fn set_score(
        &self,
        board: LeaderboardId,
        owner_id: &str,
        username: &str,
        score: i64,
    ) -> Result<i64, StoreError>;

    /// Highest scores first, ranked from 1.
    fn top(&self, board: LeaderboardId, limit: usize) -> Result<Vec<LeaderboardEntry>, StoreError>;
}

/// Append-only storage for concluded games, chat, and per-user totals.
pub trait MatchArchive: Send + Sync {
    /// Appends a history row. Returns `false` if a row for the same
    /// `(match_id, round)` already exists, in which case nothing changes.
    fn record_match(&self, record: &NewMatchRecord) -> Result<bool, StoreError>;

    /// Appends a chat line.
    fn record_chat(&self, chat: &NewChatMessage) -> Result<(), StoreError>;

    /// Adds one result to the user's cumulative totals.
    fn record_player_result(&self, user_id: &str, outcome: GameOutcome) -> Result<(), StoreError>;
}
