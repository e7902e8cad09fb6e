//! Noughts - authoritative tic-tac-toe match sessions.
//!
//! The server side of a two-player tic-tac-toe match: join admission, move
//! validation, win and draw detection, turn timeouts, disconnect forfeits,
//! rematch negotiation, chat, and outcome recording.
//!
//! # Architecture
//!
//! - **Session**: the per-match aggregate plus validation and outcome rules
//! - **Service**: every state transition and the side effects it triggers
//! - **Controller**: host lifecycle hooks bound to the service
//! - **Runtime**: a tokio task per match that serializes hooks and ticks
//! - **Store**: SQLite persistence for bans, leaderboards, history, and chat
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use noughts_server::{
//!     Collaborators, GameRepository, InitParams, MatchController, Presence,
//!     RecordingBroadcaster, ServerConfig, SystemClock,
//! };
//!
//! # fn example() -> anyhow::Result<()> {
//! let repository = GameRepository::new("noughts.db".to_string())?;
//! repository.run_migrations()?;
//! let collaborators =
//!     Collaborators::from_repository(repository, Arc::new(RecordingBroadcaster::new()));
//!
//! let (mut controller, init) = MatchController::init(
//!     "match-1".to_string(),
//!     InitParams::default(),
//!     ServerConfig::default(),
//!     collaborators,
//!     Arc::new(SystemClock),
//! );
//! assert_eq!(init.label(), "mode:classic");
//!
//! controller.join(&[Presence::new("a".into(), "Alice".into())]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod admin;
mod broadcast;
mod clock;
mod config;
mod controller;
mod db;
mod effects;
mod messages;
mod replay;
mod runtime;
mod service;
mod session;
mod store;

// Crate-level exports - Board types
pub use noughts_board::{Board, Position, Square, Symbol};

// Crate-level exports - Session
pub use session::{
    Evaluation, ExclusiveOutcome, GameMode, Invariant, InvariantSet, InvariantViolation,
    MAX_PLAYERS, MatchId, MoveCountMatchesBoard, MoveRejection, NoRematchDuringPlay, Player,
    PlayerId, SessionInvariants, SessionState, TurnHolderSeated, evaluate, validate_move,
};

// Crate-level exports - Wire messages and broadcasts
pub use broadcast::{Broadcast, Broadcaster, ChatEvent, RecordingBroadcaster};
pub use messages::{MatchData, MoveMessage, OpCode, Presence, Signal, SignalEnvelope};

// Crate-level exports - Service and controller
pub use controller::{InitParams, MatchController, MatchInit};
pub use service::{
    Collaborators, GameService, JoinRejection, MODE_KEY, RematchStatus, SKILL_LEVEL_KEY,
    SignalError, SignalReply,
};

// Crate-level exports - Runtime
pub use clock::{Clock, ManualClock, SystemClock};
pub use runtime::{
    BROADCAST_CAPACITY, ChannelBroadcaster, MatchHandle, MatchRuntime, RuntimeClosed,
};

// Crate-level exports - Persistence
pub use db::{
    ChatMessage, GameOutcome, GameRepository, LeaderboardEntry, LeaderboardRecord, MIGRATIONS,
    MatchRecord, NewChatMessage, NewMatchRecord, NewPlayerStatus, PlayerStats, PlayerStatus,
    StoreError, StoreErrorKind,
};
pub use effects::{EffectFailure, EffectLog, SideEffect};
pub use store::{BanList, Leaderboard, LeaderboardId, MatchArchive};

// Crate-level exports - Configuration and administration
pub use admin::{AdminService, LeaderboardView};
pub use config::{BanPolicy, ConfigError, DATABASE_URL_ENV, ServerConfig};
pub use replay::{
    ReplayError, ReplayLine, ReplayReport, ReplayScript, ScriptAction, ScriptEvent, replay,
};
