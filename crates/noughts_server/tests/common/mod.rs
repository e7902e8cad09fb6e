//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;

use noughts_server::{
    BanList, Clock, Collaborators, GameOutcome, GameRepository, InitParams, Leaderboard, LeaderboardEntry,
    LeaderboardId, ManualClock, MatchArchive, MatchController, MatchData, NewChatMessage,
    NewMatchRecord, OpCode, Presence, RecordingBroadcaster, ServerConfig, StoreError,
};

/// Clock reading every fixture starts at.
pub const START: i64 = 1_700_000_000;

/// In-memory stand-in for every persistence collaborator.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub banned: Mutex<Vec<String>>,
    pub scores: Mutex<HashMap<(LeaderboardId, String), i64>>,
    pub history: Mutex<Vec<NewMatchRecord>>,
    pub chat: Mutex<Vec<NewChatMessage>>,
    pub results: Mutex<Vec<(String, GameOutcome)>>,
}

impl MemoryStore {
    pub fn ban(&self, user_id: &str) {
        self.banned.lock().unwrap().push(user_id.to_string());
    }

    pub fn score(&self, board: LeaderboardId, user_id: &str) -> Option<i64> {
        self.scores
            .lock()
            .unwrap()
            .get(&(board, user_id.to_string()))
            .copied()
    }

    pub fn history(&self) -> Vec<NewMatchRecord> {
        self.history.lock().unwrap().clone()
    }

    pub fn chat(&self) -> Vec<NewChatMessage> {
        self.chat.lock().unwrap().clone()
    }

    pub fn results(&self) -> Vec<(String, GameOutcome)> {
        self.results.lock().unwrap().clone()
    }
}

impl BanList for MemoryStore {
    fn is_banned(&self, user_id: &str) -> Result<bool, StoreError> {
        Ok(self.banned.lock().unwrap().iter().any(|id| id == user_id))
    }
}

impl Leaderboard for MemoryStore {
    fn increment(
        &self,
        board: LeaderboardId,
        owner_id: &str,
        _username: &str,
        delta: i64,
    ) -> Result<i64, StoreError> {
        let mut scores = self.scores.lock().unwrap();
        let score = scores.entry((board, owner_id.to_string())).or_insert(0);
        *score += delta;
        Ok(*score)
    }

    fn set_score(
        &self,
        board: LeaderboardId,
        owner_id: &str,
        _username: &str,
        score: i64,
    ) -> Result<i64, StoreError> {
        self.scores
            .lock()
            .unwrap()
            .insert((board, owner_id.to_string()), score);
        Ok(score)
    }

    fn top(&self, board: LeaderboardId, limit: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let mut rows: Vec<_> = self
            .scores
            .lock()
            .unwrap()
            .iter()
            .filter(|((b, _), _)| *b == board)
            .map(|((_, owner), score)| (owner.clone(), *score))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(rows
            .into_iter()
            .take(limit)
            .zip(1..)
            .map(|((owner, score), rank)| LeaderboardEntry::new(owner.clone(), owner, score, rank))
            .collect())
    }
}

impl MatchArchive for MemoryStore {
    fn record_match(&self, record: &NewMatchRecord) -> Result<bool, StoreError> {
        let mut history = self.history.lock().unwrap();
        if history
            .iter()
            .any(|r| r.match_id() == record.match_id() && r.round() == record.round())
        {
            return Ok(false);
        }
        history.push(record.clone());
        Ok(true)
    }

    fn record_chat(&self, chat: &NewChatMessage) -> Result<(), StoreError> {
        self.chat.lock().unwrap().push(chat.clone());
        Ok(())
    }

    fn record_player_result(&self, user_id: &str, outcome: GameOutcome) -> Result<(), StoreError> {
        self.results
            .lock()
            .unwrap()
            .push((user_id.to_string(), outcome));
        Ok(())
    }
}

/// Collaborator whose every call fails.
#[derive(Debug, Default)]
pub struct BrokenStore;

impl BanList for BrokenStore {
    fn is_banned(&self, _user_id: &str) -> Result<bool, StoreError> {
        Err(StoreError::new("ban list offline"))
    }
}

impl Leaderboard for BrokenStore {
    fn increment(&self, _: LeaderboardId, _: &str, _: &str, _: i64) -> Result<i64, StoreError> {
        Err(StoreError::new("leaderboard offline"))
    }

    fn set_score(&self, _: LeaderboardId, _: &str, _: &str, _: i64) -> Result<i64, StoreError> {
        Err(StoreError::new("leaderboard offline"))
    }

    fn top(&self, _: LeaderboardId, _: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
        Err(StoreError::new("leaderboard offline"))
    }
}

impl MatchArchive for BrokenStore {
    fn record_match(&self, _: &NewMatchRecord) -> Result<bool, StoreError> {
        Err(StoreError::new("archive offline"))
    }

    fn record_chat(&self, _: &NewChatMessage) -> Result<(), StoreError> {
        Err(StoreError::new("archive offline"))
    }

    fn record_player_result(&self, _: &str, _: GameOutcome) -> Result<(), StoreError> {
        Err(StoreError::new("archive offline"))
    }
}

/// A controller wired to in-memory collaborators and a manual clock.
pub struct Fixture {
    pub controller: MatchController,
    pub broadcasts: Arc<RecordingBroadcaster>,
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryStore>,
}

impl Fixture {
    pub fn new(mode: &str) -> Self {
        Self::with_config(mode, None, ServerConfig::default())
    }

    pub fn with_config(mode: &str, skill_level: Option<i32>, config: ServerConfig) -> Self {
        let store = Arc::new(MemoryStore::default());
        let broadcasts = Arc::new(RecordingBroadcaster::new());
        let clock = Arc::new(ManualClock::new(START));
        let collaborators = Collaborators {
            bans: store.clone(),
            leaderboard: store.clone(),
            archive: store.clone(),
            broadcaster: broadcasts.clone(),
        };
        let params = InitParams {
            mode: Some(mode.to_string()),
            skill_level,
        };
        let (controller, _) = MatchController::init(
            "match-1".to_string(),
            params,
            config,
            collaborators,
            clock.clone(),
        );
        Self {
            controller,
            broadcasts,
            clock,
            store,
        }
    }

    /// Seats Alice (X) and Bob (O); Alice moves first.
    pub fn seat_both(&mut self) {
        self.controller.join(&[alice()]);
        self.controller.join(&[bob()]);
        self.broadcasts.take();
    }

    /// Delivers one move on its own tick at the current clock reading.
    pub fn play(&mut self, user_id: &str, position: i64) {
        let now = self.clock.now();
        self.controller.tick(now, &[move_data(user_id, position)]);
    }

    /// Op codes of everything broadcast since the last call.
    pub fn op_codes(&self) -> Vec<OpCode> {
        self.broadcasts
            .take()
            .iter()
            .map(|b| b.op_code())
            .collect()
    }
}

pub fn alice() -> Presence {
    Presence::new("alice".to_string(), "Alice".to_string())
}

pub fn bob() -> Presence {
    Presence::new("bob".to_string(), "Bob".to_string())
}

pub fn carol() -> Presence {
    Presence::new("carol".to_string(), "Carol".to_string())
}

pub fn move_data(user_id: &str, position: i64) -> MatchData {
    let payload = serde_json::to_vec(&serde_json::json!({ "position": position })).unwrap();
    MatchData::new(user_id.to_string(), OpCode::Move.code(), payload)
}

pub fn metadata(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Creates a temporary database file with schema applied, returns the file
/// handle (must stay in scope to keep the file alive) and a ready repository.
pub fn setup_test_db() -> (NamedTempFile, GameRepository) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();

    let repo = GameRepository::new(db_path).expect("Failed to create repository");
    repo.run_migrations().expect("Migrations failed");
    (db_file, repo)
}
