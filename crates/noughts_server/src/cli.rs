//! Command-line interface for noughts.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Noughts - authoritative tic-tac-toe match server tools
#[derive(Parser, Debug)]
#[command(name = "noughts")]
#[command(about = "Administration and replay for tic-tac-toe match sessions", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "noughts.toml", global = true)]
    pub config: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply pending database migrations
    Migrate,

    /// Ban a user from joining matches
    Ban {
        /// User id to ban
        user_id: String,

        /// Why the user was banned
        #[arg(long)]
        reason: Option<String>,
    },

    /// Lift a ban
    Unban {
        /// User id to unban
        user_id: String,
    },

    /// Print the wins and streak leaderboards
    Leaderboard {
        /// Rows per board (defaults to the configured limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Print recorded games for a match
    History {
        /// Match id
        match_id: String,
    },

    /// Print cumulative results for a user
    Stats {
        /// User id
        user_id: String,
    },

    /// Run a JSON event script through a match and print its broadcasts
    Replay {
        /// Path to the script
        script: PathBuf,
    },
}
