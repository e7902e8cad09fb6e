//! Messages pushed to every participant of a match.

use crate::messages::OpCode;
use crate::session::SessionState;
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, instrument};

/// A chat line as delivered to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
#[serde(tag = "type", rename = "chat")]
pub struct ChatEvent {
    /// Display name of the sender.
    pub sender: String,
    /// Text.
    pub message: String,
    /// Seconds since epoch.
    pub timestamp: i64,
}

/// Everything the session can broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Broadcast {
    /// State changed; play continues or is waiting.
    StateUpdate(SessionState),
    /// The game just concluded.
    GameEnd(SessionState),
    /// A turn timed out; an automatic move is being applied.
    Timeout(SessionState),
    /// Chat line.
    Chat(ChatEvent),
}

impl Broadcast {
    /// Op code this message travels under.
    pub fn op_code(&self) -> OpCode {
        match self {
            Broadcast::StateUpdate(_) => OpCode::State,
            Broadcast::GameEnd(_) => OpCode::GameEnd,
            Broadcast::Timeout(_) => OpCode::Timeout,
            Broadcast::Chat(_) => OpCode::Chat,
        }
    }

    /// State snapshot carried by this message, if any.
    pub fn snapshot(&self) -> Option<&SessionState> {
        match self {
            Broadcast::StateUpdate(state) | Broadcast::GameEnd(state) | Broadcast::Timeout(state) => {
                Some(state)
            }
            Broadcast::Chat(_) => None,
        }
    }

    /// JSON payload.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Broadcast::Chat(chat) => serde_json::to_vec(chat),
            Broadcast::StateUpdate(state) | Broadcast::GameEnd(state) | Broadcast::Timeout(state) => {
                serde_json::to_vec(state)
            }
        }
    }
}

/// Delivers broadcasts to a match's participants.
///
/// Delivery is fire-and-forget; the session never waits on or reacts to
/// delivery problems.
pub trait Broadcaster: Send + Sync {
    /// Sends a message to everyone in the match.
    fn broadcast(&self, message: Broadcast);
}

/// Broadcaster that keeps every message in memory.
///
/// Used by tests and by the replay command to inspect what a session sent.
#[derive(Debug, Default)]
pub struct RecordingBroadcaster {
    sent: Mutex<Vec<Broadcast>>,
}

impl RecordingBroadcaster {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns everything recorded so far.
    pub fn take(&self) -> Vec<Broadcast> {
        let mut sent = self.sent.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *sent)
    }

    /// Copy of everything recorded so far.
    pub fn sent(&self) -> Vec<Broadcast> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Broadcaster for RecordingBroadcaster {
    #[instrument(skip(self, message), fields(op_code = %message.op_code()))]
    fn broadcast(&self, message: Broadcast) {
        debug!("Recording broadcast");
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_payload_shape() {
        let chat = Broadcast::Chat(ChatEvent::new("Alice".into(), "gg".into(), 42));
        let value: serde_json::Value = serde_json::from_slice(&chat.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "chat", "sender": "Alice", "message": "gg", "timestamp": 42})
        );
        assert_eq!(chat.op_code(), OpCode::Chat);
        assert!(chat.snapshot().is_none());
    }

    #[test]
    fn test_recorder_take_drains() {
        let recorder = RecordingBroadcaster::new();
        recorder.broadcast(Broadcast::Chat(ChatEvent::new("a".into(), "hi".into(), 1)));
        assert_eq!(recorder.sent().len(), 1);
        assert_eq!(recorder.take().len(), 1);
        assert!(recorder.take().is_empty());
    }
}
