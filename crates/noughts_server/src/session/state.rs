//! The per-match aggregate.

use derive_getters::Getters;
use noughts_board::{Board, Position, Square, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

/// Unique identifier for a player (host-assigned user id).
pub type PlayerId = String;

/// Unique identifier for a match instance.
pub type MatchId = String;

/// Maximum number of players in a match.
pub const MAX_PLAYERS: usize = 2;

/// How turns are clocked.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GameMode {
    /// No turn clock.
    #[default]
    Classic,
    /// A player who does not move within the turn timeout gets an automatic move.
    Timed,
}

impl GameMode {
    /// Parses a mode name, falling back to classic for anything unrecognized.
    #[instrument]
    pub fn parse_or_classic(name: Option<&str>) -> Self {
        name.and_then(|n| n.parse().ok()).unwrap_or_default()
    }
}

/// A participant in a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Player {
    user_id: PlayerId,
    username: String,
    symbol: Symbol,
    is_connected: bool,
    wins: u32,
    losses: u32,
    streak: u32,
}

impl Player {
    /// Creates a connected player with zeroed counters.
    pub fn new(user_id: PlayerId, username: String, symbol: Symbol) -> Self {
        Self {
            user_id,
            username,
            symbol,
            is_connected: true,
            wins: 0,
            losses: 0,
            streak: 0,
        }
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        self.is_connected = connected;
    }

    pub(crate) fn record_win(&mut self) {
        self.wins += 1;
        self.streak += 1;
    }

    pub(crate) fn record_loss(&mut self) {
        self.losses += 1;
        self.streak = 0;
    }
}

/// Complete authoritative state of one match.
///
/// Serializes to the snapshot clients receive with every state broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct SessionState {
    match_id: MatchId,
    board: Board,
    players: BTreeMap<PlayerId, Player>,
    current_turn_id: Option<PlayerId>,
    winner: Option<PlayerId>,
    game_over: bool,
    is_draw: bool,
    mode: GameMode,
    turn_start_time: Option<i64>,
    turn_timeout_secs: u32,
    move_count: u32,
    rematch_requests: BTreeSet<PlayerId>,
    skill_level: Option<i32>,
    starter: Option<PlayerId>,
    round: u32,
    game_started_at: Option<i64>,
}

impl SessionState {
    /// Creates an empty match. `turn_timeout_secs` only applies to timed mode.
    #[instrument(skip(match_id), fields(match_id = %match_id))]
    pub fn new(
        match_id: MatchId,
        mode: GameMode,
        turn_timeout_secs: u32,
        skill_level: Option<i32>,
    ) -> Self {
        let turn_timeout_secs = match mode {
            GameMode::Classic => 0,
            GameMode::Timed => turn_timeout_secs,
        };
        debug!(%mode, turn_timeout_secs, "Creating session state");
        Self {
            match_id,
            board: Board::new(),
            players: BTreeMap::new(),
            current_turn_id: None,
            winner: None,
            game_over: false,
            is_draw: false,
            mode,
            turn_start_time: None,
            turn_timeout_secs,
            move_count: 0,
            rematch_requests: BTreeSet::new(),
            skill_level,
            starter: None,
            round: 1,
            game_started_at: None,
        }
    }

    /// Looks up a player by id.
    pub fn player(&self, user_id: &str) -> Option<&Player> {
        self.players.get(user_id)
    }

    /// Looks up the player who plays the given symbol.
    pub fn player_by_symbol(&self, symbol: Symbol) -> Option<&Player> {
        self.players.values().find(|p| p.symbol == symbol)
    }

    /// The other player in the match, if present.
    pub fn opponent_of(&self, user_id: &str) -> Option<&Player> {
        self.players.values().find(|p| p.user_id != user_id)
    }

    /// True once both seats are taken.
    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    /// Number of players currently connected.
    pub fn connected_count(&self) -> usize {
        self.players.values().filter(|p| p.is_connected).count()
    }

    /// Checks whether the current turn has run past the timeout.
    ///
    /// Only timed matches with a running turn clock can time out.
    pub fn is_timed_out(&self, now: i64) -> bool {
        match (self.mode, self.turn_start_time) {
            (GameMode::Timed, Some(started)) => now - started > i64::from(self.turn_timeout_secs),
            _ => false,
        }
    }

    /// Symbol assigned to the next player to join.
    pub(crate) fn next_symbol(&self) -> Symbol {
        if self.players.is_empty() {
            Symbol::X
        } else {
            Symbol::O
        }
    }

    pub(crate) fn player_mut(&mut self, user_id: &str) -> Option<&mut Player> {
        self.players.get_mut(user_id)
    }

    pub(crate) fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut()
    }

    pub(crate) fn add_player(&mut self, player: Player) {
        self.players.insert(player.user_id.clone(), player);
    }

    /// Hands the first turn to `user_id` without starting the clock.
    pub(crate) fn assign_first_turn(&mut self, user_id: PlayerId) {
        self.current_turn_id = Some(user_id);
    }

    /// Starts the current game: the turn holder becomes the starter and
    /// the turn clock begins.
    pub(crate) fn start_game(&mut self, now: i64) {
        self.starter = self.current_turn_id.clone();
        self.turn_start_time = Some(now);
        self.game_started_at = Some(now);
    }

    /// Places a symbol and bumps the move count. Callers validate first.
    pub(crate) fn place(&mut self, pos: Position, symbol: Symbol) {
        self.board.set(pos, Square::Occupied(symbol));
        self.move_count += 1;
    }

    /// Passes the turn to the other player and restarts the clock.
    pub(crate) fn pass_turn(&mut self, now: i64) {
        let next = self
            .current_turn_id
            .as_deref()
            .and_then(|current| self.opponent_of(current))
            .map(|p| p.user_id.clone());
        if let Some(next) = next {
            self.current_turn_id = Some(next);
            self.turn_start_time = Some(now);
        }
    }

    pub(crate) fn conclude(&mut self, winner: Option<PlayerId>, is_draw: bool) {
        self.game_over = true;
        self.winner = winner;
        self.is_draw = is_draw;
    }

    pub(crate) fn record_rematch_request(&mut self, user_id: &str) -> bool {
        self.rematch_requests.insert(user_id.to_string())
    }

    /// Number of connected players with a pending rematch request.
    pub(crate) fn connected_requesters(&self) -> usize {
        self.players
            .values()
            .filter(|p| p.is_connected && self.rematch_requests.contains(&p.user_id))
            .count()
    }

    /// Resets the board and outcome for a new game between the same players.
    /// The player who did not start the previous game starts this one.
    pub(crate) fn reset_for_rematch(&mut self, now: i64) {
        let next_starter = self
            .starter
            .as_deref()
            .and_then(|previous| self.opponent_of(previous))
            .map(|p| p.user_id.clone())
            .or_else(|| self.current_turn_id.clone());

        self.board.clear();
        self.move_count = 0;
        self.game_over = false;
        self.winner = None;
        self.is_draw = false;
        self.rematch_requests.clear();
        self.round += 1;
        self.current_turn_id = next_starter;
        self.start_game(now);
    }
}
