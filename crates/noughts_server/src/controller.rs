//! Binds host lifecycle hooks to the game service.
//!
//! The controller owns the only [`SessionState`] of a match. Every hook
//! takes `&mut self`, so a host that calls hooks one at a time gets
//! serialized state transitions for free.

use std::collections::HashMap;
use std::sync::Arc;

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::clock::Clock;
use crate::config::ServerConfig;
use crate::effects::EffectFailure;
use crate::messages::{MatchData, MoveMessage, OpCode, Presence};
use crate::service::{Collaborators, GameService, JoinRejection};
use crate::session::{GameMode, MatchId, SessionState};

/// Parameters a match is created with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitParams {
    /// `"classic"` or `"timed"`; anything else plays classic.
    #[serde(default)]
    pub mode: Option<String>,
    /// Skill level joiners are compared against.
    #[serde(default)]
    pub skill_level: Option<i32>,
}

/// What the host needs to register a new match.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct MatchInit {
    tick_interval_secs: u64,
    label: String,
}

/// Per-match controller.
pub struct MatchController {
    state: SessionState,
    service: GameService,
    clock: Arc<dyn Clock>,
}

impl MatchController {
    /// Creates the match state and reports the tick rate and label.
    #[instrument(skip(match_id, config, collaborators, clock), fields(match_id = %match_id))]
    pub fn init(
        match_id: MatchId,
        params: InitParams,
        config: ServerConfig,
        collaborators: Collaborators,
        clock: Arc<dyn Clock>,
    ) -> (Self, MatchInit) {
        let mode = GameMode::parse_or_classic(params.mode.as_deref());
        if let Some(requested) = params.mode.as_deref() {
            if requested != mode.as_ref() {
                warn!(requested, "Unknown mode, playing classic");
            }
        }

        let state = SessionState::new(
            match_id,
            mode,
            *config.turn_timeout_secs(),
            params.skill_level,
        );
        let init = MatchInit {
            tick_interval_secs: *config.tick_interval_secs(),
            label: format!("mode:{}", mode),
        };
        info!(%mode, label = %init.label, "Match initialized");

        let controller = Self {
            state,
            service: GameService::new(collaborators, config),
            clock,
        };
        (controller, init)
    }

    /// Decides whether a presence may join.
    ///
    /// # Errors
    ///
    /// Returns the [`JoinRejection`] reason shown to the candidate.
    #[instrument(skip(self, metadata), fields(match_id = %self.state.match_id(), user_id = %presence.user_id))]
    pub fn join_attempt(
        &self,
        presence: &Presence,
        metadata: &HashMap<String, String>,
    ) -> Result<(), JoinRejection> {
        self.service
            .admit_join(&self.state, &presence.user_id, metadata)
    }

    /// Seats admitted presences.
    #[instrument(skip(self, presences), fields(match_id = %self.state.match_id(), count = presences.len()))]
    pub fn join(&mut self, presences: &[Presence]) {
        let now = self.clock.now();
        for presence in presences {
            self.service.join(&mut self.state, presence, now);
        }
    }

    /// Handles departed presences.
    #[instrument(skip(self, presences), fields(match_id = %self.state.match_id(), count = presences.len()))]
    pub fn leave(&mut self, presences: &[Presence]) {
        let now = self.clock.now();
        for presence in presences {
            self.service.leave(&mut self.state, &presence.user_id, now);
        }
    }

    /// Runs one tick: the timeout check, then every queued move in order.
    ///
    /// Unparseable move payloads and rejected moves are logged and skipped;
    /// other op codes are ignored.
    #[instrument(skip(self, messages), fields(match_id = %self.state.match_id(), queued = messages.len()))]
    pub fn tick(&mut self, now: i64, messages: &[MatchData]) {
        self.service.check_timeout(&mut self.state, now);

        for message in messages {
            if OpCode::from_repr(message.op_code) != Some(OpCode::Move) {
                debug!(op_code = message.op_code, "Ignoring non-move message");
                continue;
            }
            let mv: MoveMessage = match serde_json::from_slice(&message.data) {
                Ok(mv) => mv,
                Err(e) => {
                    warn!(user_id = %message.user_id, error = %e, "Malformed move payload");
                    continue;
                }
            };
            if let Err(reason) =
                self.service
                    .process_move(&mut self.state, &message.user_id, mv.position, now)
            {
                info!(user_id = %message.user_id, position = mv.position, %reason, "Move rejected");
            }
        }
    }

    /// Handles an out-of-band signal. Failures come back as
    /// `"error: <reason>"`.
    #[instrument(skip(self, raw), fields(match_id = %self.state.match_id()))]
    pub fn signal(&mut self, raw: &str) -> String {
        let now = self.clock.now();
        match self.service.handle_signal(&mut self.state, raw, now) {
            Ok(reply) => reply.to_string(),
            Err(e) => {
                warn!(error = %e, "Signal refused");
                format!("error: {}", e)
            }
        }
    }

    /// Shuts the match down and hands back its final state.
    #[instrument(skip(self), fields(match_id = %self.state.match_id()))]
    pub fn terminate(self, grace_seconds: u64) -> SessionState {
        info!(
            grace_seconds,
            game_over = self.state.game_over(),
            round = self.state.round(),
            "Match terminated"
        );
        self.state
    }

    /// Current time on the match clock.
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Removes and returns best-effort write failures recorded so far.
    pub fn drain_effect_failures(&mut self) -> Vec<EffectFailure> {
        self.service.drain_effect_failures()
    }
}
