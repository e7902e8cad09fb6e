//! The tokio match task: serialized hooks, ticking, and broadcasts.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{START, alice, bob, metadata, move_data};
use noughts_server::{
    ChannelBroadcaster, Collaborators, InitParams, JoinRejection, ManualClock, MatchController,
    MatchRuntime, OpCode, ServerConfig, Square, Symbol,
};

fn spawn(mode: &str) -> (noughts_server::MatchHandle, Arc<ManualClock>) {
    let store = Arc::new(common::MemoryStore::default());
    let broadcaster = ChannelBroadcaster::default();
    let clock = Arc::new(ManualClock::new(START));
    let collaborators = Collaborators {
        bans: store.clone(),
        leaderboard: store.clone(),
        archive: store,
        broadcaster: Arc::new(broadcaster.clone()),
    };
    let (controller, init) = MatchController::init(
        "rt-match".to_string(),
        InitParams {
            mode: Some(mode.to_string()),
            skill_level: None,
        },
        ServerConfig::default(),
        collaborators,
        clock.clone(),
    );
    let handle = MatchRuntime::spawn(controller, *init.tick_interval_secs(), &broadcaster);
    (handle, clock)
}

#[tokio::test(start_paused = true)]
async fn test_moves_apply_on_next_tick() {
    let (handle, _clock) = spawn("classic");
    let mut rx = handle.subscribe();

    handle.join(vec![alice(), bob()]).await.unwrap();
    assert_eq!(rx.recv().await.unwrap().op_code(), OpCode::State);

    handle.send(move_data("alice", 4)).unwrap();
    assert_eq!(*handle.snapshot().await.unwrap().move_count(), 0);

    tokio::time::sleep(Duration::from_millis(1_100)).await;
    let state = handle.snapshot().await.unwrap();
    assert_eq!(state.board().squares()[4], Square::Occupied(Symbol::X));
    assert_eq!(state.current_turn_id().as_deref(), Some("bob"));
    assert_eq!(rx.recv().await.unwrap().op_code(), OpCode::State);

    let final_state = handle.terminate(0).await.unwrap();
    assert_eq!(*final_state.move_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_join_attempt_and_signal_round_trip() {
    let (handle, _clock) = spawn("timed");

    assert_eq!(
        handle
            .join_attempt(alice(), metadata(&[("mode", "classic")]))
            .await
            .unwrap(),
        Err(JoinRejection::ModeMismatch)
    );
    handle.join(vec![alice(), bob()]).await.unwrap();

    assert_eq!(
        handle
            .signal(r#"{"userId":"alice","type":"rematch_request"}"#)
            .await
            .unwrap(),
        "error: game is still in progress"
    );
    assert!(handle.drain_effect_failures().await.unwrap().is_empty());
    handle.terminate(0).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_timeout_fires_from_the_tick_loop() {
    let (handle, clock) = spawn("timed");
    let mut rx = handle.subscribe();
    handle.join(vec![alice(), bob()]).await.unwrap();
    rx.recv().await.unwrap();

    clock.set(START + 31);
    tokio::time::sleep(Duration::from_millis(1_100)).await;

    assert_eq!(rx.recv().await.unwrap().op_code(), OpCode::Timeout);
    assert_eq!(rx.recv().await.unwrap().op_code(), OpCode::State);
    let state = handle.snapshot().await.unwrap();
    assert_eq!(state.board().squares()[0], Square::Occupied(Symbol::X));
    handle.terminate(0).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_terminate_returns_final_state() {
    let (handle, _clock) = spawn("classic");
    handle.join(vec![alice()]).await.unwrap();
    let state = handle.terminate(5).await.unwrap();
    assert_eq!(state.match_id(), "rt-match");
    assert_eq!(state.players().len(), 1);
    assert!(!*state.game_over());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_hooks_run_on_multi_thread_runtime() {
    let (handle, _clock) = spawn("classic");

    assert_eq!(
        handle.join_attempt(alice(), metadata(&[])).await.unwrap(),
        Ok(())
    );
    handle.join(vec![alice(), bob()]).await.unwrap();
    handle.send(move_data("alice", 0)).unwrap();

    tokio::time::sleep(Duration::from_millis(1_200)).await;
    let state = handle.snapshot().await.unwrap();
    assert_eq!(state.board().squares()[0], Square::Occupied(Symbol::X));

    let final_state = handle.terminate(0).await.unwrap();
    assert_eq!(*final_state.move_count(), 1);
}
