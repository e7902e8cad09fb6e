//! Out-of-band signal dispatch.

use tracing::{debug, instrument};

use super::{GameService, RematchStatus, SignalError};
use crate::messages::{Signal, SignalEnvelope};
use crate::session::SessionState;

/// Successful outcome of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum SignalReply {
    /// A rematch request was handled.
    #[display("{}", _0)]
    Rematch(RematchStatus),
    /// A chat line went out.
    #[display("message_sent")]
    MessageSent,
}

impl GameService {
    /// Parses and handles a raw signal payload.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError`] for malformed or unknown payloads, and for
    /// anything the rematch or chat handlers refuse.
    #[instrument(skip(self, state, raw), fields(match_id = %state.match_id()))]
    pub fn handle_signal(
        &mut self,
        state: &mut SessionState,
        raw: &str,
        now: i64,
    ) -> Result<SignalReply, SignalError> {
        let envelope = parse_signal(raw)?;
        debug!(user_id = %envelope.user_id, signal = ?envelope.signal, "Signal received");

        match envelope.signal {
            Signal::RematchRequest => self
                .request_rematch(state, &envelope.user_id, now)
                .map(SignalReply::Rematch),
            Signal::ChatMessage { message } => self
                .send_chat(state, &envelope.user_id, &message, now)
                .map(|()| SignalReply::MessageSent),
        }
    }
}

/// Turns raw JSON into a signal, telling unknown kinds apart from broken
/// payloads of a known kind.
fn parse_signal(raw: &str) -> Result<SignalEnvelope, SignalError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| SignalError::Malformed(e.to_string()))?;

    let has_user = value
        .get("userId")
        .and_then(serde_json::Value::as_str)
        .is_some_and(|id| !id.is_empty());
    if !has_user {
        return Err(SignalError::MissingUserId);
    }

    let kind = value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or(SignalError::MissingType)?
        .to_string();
    if !Signal::KINDS.contains(&kind.as_str()) {
        return Err(SignalError::UnknownType(kind));
    }

    serde_json::from_value(value).map_err(|e| SignalError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_errors_in_order() {
        assert!(matches!(parse_signal("not json"), Err(SignalError::Malformed(_))));
        assert_eq!(
            parse_signal(r#"{"type":"rematch_request"}"#),
            Err(SignalError::MissingUserId)
        );
        assert_eq!(
            parse_signal(r#"{"userId":"u1"}"#),
            Err(SignalError::MissingType)
        );
        assert_eq!(
            parse_signal(r#"{"userId":"u1","type":"surrender"}"#),
            Err(SignalError::UnknownType("surrender".into()))
        );
        assert!(matches!(
            parse_signal(r#"{"userId":"u1","type":"chat_message"}"#),
            Err(SignalError::Malformed(_))
        ));
    }

    #[test]
    fn test_reply_strings() {
        assert_eq!(
            SignalReply::Rematch(RematchStatus::Accepted).to_string(),
            "rematch_accepted"
        );
        assert_eq!(SignalReply::MessageSent.to_string(), "message_sent");
    }
}
