//! In-match chat.

use tracing::{debug, instrument};

use super::{GameService, SignalError};
use crate::broadcast::{Broadcast, ChatEvent};
use crate::db::NewChatMessage;
use crate::effects::SideEffect;
use crate::session::SessionState;

impl GameService {
    /// Broadcasts a chat line and stores it best-effort.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError`] for empty or oversized text, or an unknown
    /// sender.
    #[instrument(skip(self, state, message), fields(match_id = %state.match_id(), len = message.chars().count()))]
    pub fn send_chat(
        &mut self,
        state: &SessionState,
        user_id: &str,
        message: &str,
        now: i64,
    ) -> Result<(), SignalError> {
        let max = *self.config.chat_max_chars();
        let len = message.chars().count();
        if len == 0 || len > max {
            return Err(SignalError::MessageLength { max });
        }

        let player = state.player(user_id).ok_or(SignalError::PlayerNotFound)?;

        self.broadcast(Broadcast::Chat(ChatEvent::new(
            player.username().clone(),
            message.to_string(),
            now,
        )));

        let line = NewChatMessage::new(
            state.match_id().clone(),
            user_id.to_string(),
            player.username().clone(),
            message.to_string(),
            now,
        );
        match self.collaborators.archive.record_chat(&line) {
            Ok(()) => debug!("Chat stored"),
            Err(e) => self.effects.record(SideEffect::Chat, &e, now),
        }
        Ok(())
    }
}
