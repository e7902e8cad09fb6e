//! Wire messages exchanged with the host runtime.

use crate::session::PlayerId;
use derive_new::new;
use serde::{Deserialize, Serialize};

/// Operation codes for match data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::FromRepr)]
#[repr(i64)]
pub enum OpCode {
    /// Client to server: place a symbol.
    Move = 1,
    /// Server to client: state snapshot.
    State = 2,
    /// Server to client: final snapshot of a concluded game.
    GameEnd = 3,
    /// Server to client: a turn timed out and an automatic move follows.
    Timeout = 4,
    /// Server to client: chat line.
    Chat = 5,
}

impl OpCode {
    /// Numeric code on the wire.
    pub fn code(self) -> i64 {
        self as i64
    }
}

/// A connection identity as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Presence {
    /// Host-assigned user id.
    pub user_id: PlayerId,
    /// Display name.
    pub username: String,
}

/// A message queued by a client for the next tick.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct MatchData {
    /// Sender.
    pub user_id: PlayerId,
    /// Raw op code.
    pub op_code: i64,
    /// JSON payload.
    pub data: Vec<u8>,
}

/// Payload of a move message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveMessage {
    /// Board index; may be anything the client sent, validation happens later.
    pub position: i64,
}

/// Out-of-band signal addressed to a match.
///
/// ```json
/// {"userId": "u1", "type": "chat_message", "message": "gg"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignalEnvelope {
    /// Sender; empty when absent so the caller can report it explicitly.
    #[serde(rename = "userId", default)]
    pub user_id: PlayerId,
    /// Type-specific body.
    #[serde(flatten)]
    pub signal: Signal,
}

/// Recognized signal kinds, keyed by the `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signal {
    /// Ask to play again once the game is over.
    RematchRequest,
    /// Send a chat line to everyone in the match.
    ChatMessage {
        /// Text, 1 to 500 characters.
        message: String,
    },
}

impl Signal {
    /// Every recognized `type` value.
    pub const KINDS: [&'static str; 2] = ["rematch_request", "chat_message"];
}
