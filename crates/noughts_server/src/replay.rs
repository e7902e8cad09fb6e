//! Scripted replay of match events.
//!
//! A script lists host events with offsets in seconds from a start time:
//!
//! ```json
//! {
//!   "match_id": "demo",
//!   "params": {"mode": "timed"},
//!   "start": 1700000000,
//!   "events": [
//!     {"at": 0, "event": "join", "user_id": "a", "username": "Alice"},
//!     {"at": 0, "event": "join", "user_id": "b", "username": "Bob"},
//!     {"at": 1, "event": "move", "user_id": "a", "position": 4},
//!     {"at": 1, "event": "tick"},
//!     {"at": 40, "event": "tick"},
//!     {"at": 41, "event": "signal", "payload": {"userId": "a", "type": "chat_message", "message": "gg"}}
//!   ]
//! }
//! ```
//!
//! Moves are queued and applied on the next `tick`, as a host would.

use std::collections::HashMap;
use std::sync::Arc;

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::broadcast::{Broadcaster, RecordingBroadcaster};
use crate::clock::ManualClock;
use crate::config::ServerConfig;
use crate::controller::{InitParams, MatchController};
use crate::effects::EffectFailure;
use crate::messages::{MatchData, MoveMessage, OpCode, Presence};
use crate::service::Collaborators;
use crate::session::{MatchId, PlayerId, SessionState};

/// A full replay script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplayScript {
    /// Match id used for history and chat rows.
    #[serde(default = "default_match_id")]
    pub match_id: MatchId,
    /// Match creation parameters.
    #[serde(default)]
    pub params: InitParams,
    /// Clock reading at offset 0.
    #[serde(default)]
    pub start: i64,
    /// Events in the order they are delivered.
    pub events: Vec<ScriptEvent>,
}

fn default_match_id() -> MatchId {
    "replay".to_string()
}

/// One scripted event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptEvent {
    /// Seconds after `start`.
    #[serde(default)]
    pub at: i64,
    /// What happens.
    #[serde(flatten)]
    pub action: ScriptAction,
}

/// Host events a script can deliver.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScriptAction {
    /// Join attempt followed, if admitted, by a join.
    Join {
        /// User id.
        user_id: PlayerId,
        /// Display name.
        username: String,
        /// Join metadata such as `skill_level` and `mode`.
        #[serde(default)]
        metadata: HashMap<String, String>,
    },
    /// Disconnect.
    Leave {
        /// User id.
        user_id: PlayerId,
    },
    /// Queue a move for the next tick.
    Move {
        /// User id.
        user_id: PlayerId,
        /// Board index.
        position: i64,
    },
    /// Run one tick with everything queued so far.
    Tick,
    /// Deliver an out-of-band signal.
    Signal {
        /// Signal JSON.
        payload: serde_json::Value,
    },
}

/// A line of replay output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplayLine {
    /// Something the match broadcast.
    Broadcast {
        /// Seconds since epoch on the replay clock.
        at: i64,
        /// Wire op code.
        op_code: i64,
        /// Decoded JSON payload.
        payload: serde_json::Value,
    },
    /// A join the match refused.
    JoinRejected {
        /// Seconds since epoch on the replay clock.
        at: i64,
        /// Candidate.
        user_id: PlayerId,
        /// Refusal reason.
        reason: String,
    },
    /// Result string of a signal.
    SignalReply {
        /// Seconds since epoch on the replay clock.
        at: i64,
        /// Result or `"error: ..."`.
        reply: String,
    },
}

/// Everything a replay produced.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    /// Output lines in order.
    pub lines: Vec<ReplayLine>,
    /// State after the last event.
    pub final_state: SessionState,
    /// Side-effect failures recorded during the run.
    pub effect_failures: Vec<EffectFailure>,
}

/// Replay failure.
#[derive(Debug, Display, From)]
pub enum ReplayError {
    /// The script could not be read.
    #[display("Failed to read script: {}", _0)]
    Io(std::io::Error),
    /// The script or a payload is not valid JSON for its purpose.
    #[display("Invalid replay JSON: {}", _0)]
    Json(serde_json::Error),
}

impl std::error::Error for ReplayError {}

impl ReplayScript {
    /// Loads a script from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ReplayError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let script: Self = serde_json::from_str(&content)?;
        debug!(events = script.events.len(), "Replay script loaded");
        Ok(script)
    }
}

/// Runs `script` through a fresh controller.
///
/// `collaborators` receives the recording broadcaster and returns the
/// persistence handles to use.
///
/// # Errors
///
/// Returns [`ReplayError`] if a move or broadcast cannot be encoded.
#[instrument(skip(script, config, collaborators), fields(match_id = %script.match_id))]
pub fn replay(
    script: &ReplayScript,
    config: ServerConfig,
    collaborators: impl FnOnce(Arc<dyn Broadcaster>) -> Collaborators,
) -> Result<ReplayReport, ReplayError> {
    let clock = Arc::new(ManualClock::new(script.start));
    let recorder = Arc::new(RecordingBroadcaster::new());
    let broadcaster: Arc<dyn Broadcaster> = recorder.clone();
    let (mut controller, init) = MatchController::init(
        script.match_id.clone(),
        script.params.clone(),
        config,
        collaborators(broadcaster),
        clock.clone(),
    );
    info!(label = %init.label(), events = script.events.len(), "Replaying script");

    let mut lines = Vec::new();
    let mut queued = Vec::new();
    for event in &script.events {
        let now = script.start + event.at;
        clock.set(now);

        let reply = match &event.action {
            ScriptAction::Join {
                user_id,
                username,
                metadata,
            } => {
                let presence = Presence::new(user_id.clone(), username.clone());
                match controller.join_attempt(&presence, metadata) {
                    Ok(()) => {
                        controller.join(&[presence]);
                        None
                    }
                    Err(reason) => Some(ReplayLine::JoinRejected {
                        at: now,
                        user_id: user_id.clone(),
                        reason: reason.to_string(),
                    }),
                }
            }
            ScriptAction::Leave { user_id } => {
                let username = controller
                    .state()
                    .player(user_id)
                    .map(|p| p.username().clone())
                    .unwrap_or_default();
                controller.leave(&[Presence::new(user_id.clone(), username)]);
                None
            }
            ScriptAction::Move { user_id, position } => {
                let data = serde_json::to_vec(&MoveMessage {
                    position: *position,
                })?;
                queued.push(MatchData::new(user_id.clone(), OpCode::Move.code(), data));
                None
            }
            ScriptAction::Tick => {
                controller.tick(now, &std::mem::take(&mut queued));
                None
            }
            ScriptAction::Signal { payload } => Some(ReplayLine::SignalReply {
                at: now,
                reply: controller.signal(&payload.to_string()),
            }),
        };

        for message in recorder.take() {
            lines.push(ReplayLine::Broadcast {
                at: now,
                op_code: message.op_code().code(),
                payload: serde_json::from_slice(&message.encode()?)?,
            });
        }
        lines.extend(reply);
    }

    if !queued.is_empty() {
        warn!(count = queued.len(), "Script ended with moves still queued");
    }

    let effect_failures = controller.drain_effect_failures();
    Ok(ReplayReport {
        lines,
        final_state: controller.terminate(0),
        effect_failures,
    })
}
