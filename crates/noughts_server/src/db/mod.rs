//! SQLite persistence for bans, leaderboards, match history, and chat.

mod error;
mod models;
mod repository;
mod schema;

use diesel_migrations::{EmbeddedMigrations, embed_migrations};

pub use error::{StoreError, StoreErrorKind};
pub use models::{
    ChatMessage, GameOutcome, LeaderboardEntry, LeaderboardRecord, MatchRecord, NewChatMessage,
    NewMatchRecord, NewPlayerStatus, PlayerStats, PlayerStatus,
};
pub use repository::GameRepository;

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");
