//! Game service: every state transition of a match and the side effects
//! it triggers.
//!
//! The service never owns a [`SessionState`]; the controller lends it one
//! per call. Persistence and broadcasting go through the shared
//! collaborators in [`Collaborators`], and every persistence failure is
//! logged and kept in the service's [`EffectLog`] instead of failing the
//! transition.

mod admission;
mod chat;
mod error;
mod lifecycle;
mod play;
mod recording;
mod rematch;
mod signal;

use std::sync::Arc;

use tracing::{error, instrument};

use crate::broadcast::{Broadcast, Broadcaster};
use crate::config::ServerConfig;
use crate::db::GameRepository;
use crate::effects::{EffectFailure, EffectLog};
use crate::session::{InvariantSet, SessionInvariants, SessionState};
use crate::store::{BanList, Leaderboard, MatchArchive};

pub use admission::{MODE_KEY, SKILL_LEVEL_KEY};
pub use error::{JoinRejection, SignalError};
pub use rematch::RematchStatus;
pub use signal::SignalReply;

/// Shared, thread-safe handles to everything outside the match.
#[derive(Clone)]
pub struct Collaborators {
    /// Ban lookups during admission.
    pub bans: Arc<dyn BanList>,
    /// Ranked scores written on every win.
    pub leaderboard: Arc<dyn Leaderboard>,
    /// History, chat, and per-user totals.
    pub archive: Arc<dyn MatchArchive>,
    /// Delivery to the match's participants.
    pub broadcaster: Arc<dyn Broadcaster>,
}

impl Collaborators {
    /// Uses one repository for every persistence concern.
    pub fn from_repository(repository: GameRepository, broadcaster: Arc<dyn Broadcaster>) -> Self {
        let repository = Arc::new(repository);
        Self {
            bans: repository.clone(),
            leaderboard: repository.clone(),
            archive: repository,
            broadcaster,
        }
    }
}

/// Orchestrates joins, moves, timeouts, forfeits, rematches, and chat.
pub struct GameService {
    collaborators: Collaborators,
    config: ServerConfig,
    effects: EffectLog,
}

impl GameService {
    /// Creates a service for one match.
    pub fn new(collaborators: Collaborators, config: ServerConfig) -> Self {
        Self {
            collaborators,
            config,
            effects: EffectLog::new(),
        }
    }

    /// Settings in effect for this match.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Removes and returns the side-effect failures recorded so far.
    pub fn drain_effect_failures(&mut self) -> Vec<EffectFailure> {
        self.effects.drain()
    }

    fn broadcast(&self, message: Broadcast) {
        self.collaborators.broadcaster.broadcast(message);
    }

    /// Logs any broken invariant. Play continues either way.
    #[instrument(skip(self, state), fields(match_id = %state.match_id()))]
    fn check_invariants(&self, state: &SessionState) {
        if let Err(violations) = <SessionInvariants as InvariantSet<SessionState>>::check_all(state)
        {
            for violation in violations {
                error!(%violation, "Internal inconsistency in session state");
            }
        }
    }
}
