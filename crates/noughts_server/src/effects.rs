//! Record of best-effort side effects that failed.
//!
//! Leaderboard, history, stats, and chat writes never block or roll back
//! a game. When one fails it is logged and also kept here so the host can
//! inspect or retry it.

use derive_getters::Getters;
use derive_new::new;
use serde::Serialize;
use tracing::{instrument, warn};

use crate::db::{StoreError, StoreErrorKind};

/// Which external write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SideEffect {
    /// `global_wins` increment for the winner.
    LeaderboardIncrement,
    /// `win_streaks` overwrite for the winner.
    LeaderboardSet,
    /// Match history row.
    MatchHistory,
    /// Cumulative per-user totals.
    PlayerStats,
    /// Chat transcript line.
    Chat,
}

/// A failed side effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters, new)]
pub struct EffectFailure {
    effect: SideEffect,
    kind: StoreErrorKind,
    error: String,
    at: i64,
}

/// Append-only list of failures since the last drain.
#[derive(Debug, Default)]
pub struct EffectLog {
    failures: Vec<EffectFailure>,
}

impl EffectLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs and keeps a failure.
    #[instrument(skip(self, error), fields(error = %error))]
    pub fn record(&mut self, effect: SideEffect, error: &StoreError, at: i64) {
        warn!(transient = error.kind.is_transient(), "Best-effort write failed");
        self.failures.push(EffectFailure::new(
            effect,
            error.kind,
            error.message.clone(),
            at,
        ));
    }

    /// Number of failures waiting to be drained.
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// True when nothing failed since the last drain.
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Removes and returns every recorded failure, oldest first.
    pub fn drain(&mut self) -> Vec<EffectFailure> {
        std::mem::take(&mut self.failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_log() {
        let mut log = EffectLog::new();
        log.record(SideEffect::Chat, &StoreError::new("disk full"), 7);
        log.record(SideEffect::MatchHistory, &StoreError::new("locked"), 8);
        assert_eq!(log.len(), 2);

        let drained = log.drain();
        assert_eq!(drained[0].effect(), &SideEffect::Chat);
        assert_eq!(drained[0].error(), "disk full");
        assert_eq!(drained[0].kind(), &StoreErrorKind::Unavailable);
        assert_eq!(drained[1].at(), &8);
        assert!(log.is_empty());
    }
}
