//! Database models and domain types.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::{StoreError, schema};

/// Ban flag for a user.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::player_status)]
#[diesel(primary_key(user_id))]
pub struct PlayerStatus {
    user_id: String,
    is_banned: bool,
    reason: Option<String>,
    updated_at: NaiveDateTime,
}

/// Insertable ban flag.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::player_status)]
pub struct NewPlayerStatus {
    user_id: String,
    is_banned: bool,
    reason: Option<String>,
}

/// Cumulative results for a user across all matches.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::player_stats)]
#[diesel(primary_key(user_id))]
pub struct PlayerStats {
    user_id: String,
    total_wins: i32,
    total_losses: i32,
    total_draws: i32,
    skill_rating: i32,
    updated_at: NaiveDateTime,
}

impl PlayerStats {
    /// Total games with a recorded result.
    pub fn total_games(&self) -> i32 {
        self.total_wins + self.total_losses + self.total_draws
    }

    /// Win rate as a percentage (0.0-100.0).
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub fn win_rate(&self) -> f64 {
        let total = self.total_games();
        if total == 0 {
            0.0
        } else {
            (self.total_wins as f64 / total as f64) * 100.0
        }
    }
}

/// A concluded game.
#[derive(Debug, Clone, Queryable, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::match_history)]
pub struct MatchRecord {
    match_id: String,
    round: i32,
    winner_id: Option<String>,
    loser_id: Option<String>,
    mode: String,
    duration_seconds: i64,
    completed_at: NaiveDateTime,
}

/// Insertable history row. `(match_id, round)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Insertable, new, Getters)]
#[diesel(table_name = schema::match_history)]
pub struct NewMatchRecord {
    match_id: String,
    round: i32,
    winner_id: Option<String>,
    loser_id: Option<String>,
    mode: String,
    duration_seconds: i64,
}

/// A persisted chat line.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::match_chat)]
pub struct ChatMessage {
    id: i32,
    match_id: String,
    user_id: String,
    username: String,
    message: String,
    sent_at: i64,
}

/// Insertable chat line.
#[derive(Debug, Clone, PartialEq, Eq, Insertable, new, Getters)]
#[diesel(table_name = schema::match_chat)]
pub struct NewChatMessage {
    match_id: String,
    user_id: String,
    username: String,
    message: String,
    sent_at: i64,
}

/// Stored leaderboard score.
#[derive(Debug, Clone, Queryable, Selectable, Getters)]
#[diesel(table_name = schema::leaderboard_records)]
pub struct LeaderboardRecord {
    leaderboard_id: String,
    owner_id: String,
    username: String,
    score: i64,
    updated_at: NaiveDateTime,
}

/// Ranked leaderboard row as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct LeaderboardEntry {
    user_id: String,
    username: String,
    score: i64,
    rank: i64,
}

/// Game outcome from one player's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameOutcome {
    /// Player won the game.
    Win,
    /// Player lost the game.
    Loss,
    /// Game ended in a draw.
    Draw,
}

impl GameOutcome {
    /// Converts outcome to the string used in logs and exports.
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Loss => "loss",
            Self::Draw => "draw",
        }
    }

    /// Parses an outcome string.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the string is not a valid outcome value.
    pub fn from_db_string(s: &str) -> Result<Self, StoreError> {
        match s {
            "win" => Ok(Self::Win),
            "loss" => Ok(Self::Loss),
            "draw" => Ok(Self::Draw),
            _ => Err(StoreError::invalid(format!("Invalid outcome: '{}'", s))),
        }
    }
}
