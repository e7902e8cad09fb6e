//! Chat, signal errors, and best-effort side effects.

mod common;

use std::sync::Arc;

use common::{Fixture, START, alice, bob};
use noughts_server::{
    Broadcast, ChatEvent, Collaborators, InitParams, ManualClock, MatchController,
    RecordingBroadcaster, ServerConfig, SideEffect, StoreErrorKind,
};

fn chat(user: &str, message: &str) -> String {
    serde_json::json!({"userId": user, "type": "chat_message", "message": message}).to_string()
}

#[test]
fn test_chat_is_broadcast_and_stored() {
    let mut fx = Fixture::new("classic");
    fx.seat_both();
    fx.clock.set(START + 5);

    assert_eq!(fx.controller.signal(&chat("bob", "good luck")), "message_sent");

    assert_eq!(
        fx.broadcasts.take(),
        vec![Broadcast::Chat(ChatEvent::new(
            "Bob".to_string(),
            "good luck".to_string(),
            START + 5
        ))]
    );
    let stored = fx.store.chat();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].match_id(), "match-1");
    assert_eq!(stored[0].user_id(), "bob");
    assert_eq!(stored[0].username(), "Bob");
    assert_eq!(*stored[0].sent_at(), START + 5);
}

#[test]
fn test_chat_works_after_game_over() {
    let mut fx = Fixture::new("classic");
    fx.seat_both();
    fx.controller.leave(&[bob()]);
    assert_eq!(fx.controller.signal(&chat("alice", "gg")), "message_sent");
}

#[test]
fn test_chat_length_limits() {
    let mut fx = Fixture::new("classic");
    fx.seat_both();

    let error = "error: message must be between 1-500 characters";
    assert_eq!(fx.controller.signal(&chat("alice", "")), error);
    assert_eq!(fx.controller.signal(&chat("alice", &"a".repeat(501))), error);
    assert_eq!(
        fx.controller.signal(&chat("alice", &"a".repeat(500))),
        "message_sent"
    );
    // Counted in characters, not bytes.
    assert_eq!(
        fx.controller.signal(&chat("alice", &"é".repeat(500))),
        "message_sent"
    );
    assert_eq!(fx.store.chat().len(), 2);
}

#[test]
fn test_chat_from_stranger() {
    let mut fx = Fixture::new("classic");
    fx.seat_both();
    assert_eq!(
        fx.controller.signal(&chat("mallory", "hi")),
        "error: player not found"
    );
    assert!(fx.broadcasts.take().is_empty());
}

#[test]
fn test_signal_errors() {
    let mut fx = Fixture::new("classic");
    fx.seat_both();

    assert!(fx.controller.signal("{").starts_with("error: invalid signal data"));
    assert_eq!(
        fx.controller.signal(r#"{"type":"rematch_request"}"#),
        "error: missing userId"
    );
    assert_eq!(
        fx.controller.signal(r#"{"userId":"alice"}"#),
        "error: missing signal type"
    );
    assert_eq!(
        fx.controller.signal(r#"{"userId":"alice","type":"surrender"}"#),
        "error: unknown signal type: surrender"
    );
}

#[test]
fn test_failed_writes_never_roll_back_the_game() {
    let broken = Arc::new(common::BrokenStore);
    let broadcasts = Arc::new(RecordingBroadcaster::new());
    let collaborators = Collaborators {
        bans: Arc::new(common::MemoryStore::default()),
        leaderboard: broken.clone(),
        archive: broken,
        broadcaster: broadcasts.clone(),
    };
    let clock = Arc::new(ManualClock::new(START));
    let (mut controller, _) = MatchController::init(
        "match-broken".to_string(),
        InitParams::default(),
        ServerConfig::default(),
        collaborators,
        clock,
    );

    controller.join(&[alice(), bob()]);
    for (user, position) in [("alice", 0), ("bob", 3), ("alice", 1), ("bob", 4), ("alice", 2)] {
        controller.tick(START, &[common::move_data(user, position)]);
    }
    assert_eq!(controller.signal(&chat("bob", "gg")), "message_sent");

    let state = controller.state();
    assert!(*state.game_over());
    assert_eq!(*state.player("alice").unwrap().wins(), 1);
    assert_eq!(*state.player("bob").unwrap().losses(), 1);
    assert!(
        broadcasts
            .take()
            .iter()
            .any(|b| matches!(b, Broadcast::GameEnd(_)))
    );

    let failures = controller.drain_effect_failures();
    let effects: Vec<_> = failures.iter().map(|f| *f.effect()).collect();
    assert_eq!(
        effects,
        vec![
            SideEffect::LeaderboardIncrement,
            SideEffect::LeaderboardSet,
            SideEffect::PlayerStats,
            SideEffect::PlayerStats,
            SideEffect::MatchHistory,
            SideEffect::Chat,
        ]
    );
    assert!(failures[0].error().contains("leaderboard offline"));
    assert!(
        failures
            .iter()
            .all(|f| *f.kind() == StoreErrorKind::Unavailable)
    );
    assert!(controller.drain_effect_failures().is_empty());
}
