//! Noughts - administration and replay CLI.

#![warn(missing_docs)]

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use noughts_server::{
    AdminService, Collaborators, GameRepository, ReplayScript, ServerConfig, replay,
};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,noughts_server=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load(Some(&cli.config))?;
    let repository = GameRepository::new(config.database_url().clone())?;

    match cli.command {
        Command::Migrate => {
            let applied = repository.run_migrations()?;
            println!("Applied {} migration(s)", applied);
            Ok(())
        }
        Command::Ban { user_id, reason } => {
            AdminService::new(repository).ban(&user_id, reason)?;
            println!("Banned {}", user_id);
            Ok(())
        }
        Command::Unban { user_id } => {
            AdminService::new(repository).unban(&user_id)?;
            println!("Unbanned {}", user_id);
            Ok(())
        }
        Command::Leaderboard { limit } => {
            let limit = limit.unwrap_or(*config.leaderboard_limit());
            print_leaderboards(&AdminService::new(repository), limit)
        }
        Command::History { match_id } => {
            let records = AdminService::new(repository).history(&match_id)?;
            if records.is_empty() {
                println!("No games recorded for {}", match_id);
            }
            for record in records {
                println!(
                    "round {:>3}  winner {:<16} loser {:<16} {:<8} {:>5}s  {}",
                    record.round(),
                    record.winner_id().as_deref().unwrap_or("-"),
                    record.loser_id().as_deref().unwrap_or("-"),
                    record.mode(),
                    record.duration_seconds(),
                    record.completed_at(),
                );
            }
            Ok(())
        }
        Command::Stats { user_id } => {
            match AdminService::new(repository).stats(&user_id)? {
                Some(stats) => println!(
                    "{}: {} wins, {} losses, {} draws ({:.1}% win rate)",
                    user_id,
                    stats.total_wins(),
                    stats.total_losses(),
                    stats.total_draws(),
                    stats.win_rate(),
                ),
                None => println!("No results for {}", user_id),
            }
            Ok(())
        }
        Command::Replay { script } => run_replay(&script, config, repository),
    }
}

#[instrument(skip(admin))]
fn print_leaderboards(admin: &AdminService, limit: usize) -> Result<()> {
    for view in admin.leaderboards(limit)? {
        println!("== {} ==", view.board());
        for entry in view.entries() {
            println!(
                "{:>3}. {:<20} {:>6}",
                entry.rank(),
                entry.username(),
                entry.score()
            );
        }
    }
    Ok(())
}

#[instrument(skip(config, repository))]
fn run_replay(
    script: &std::path::Path,
    config: ServerConfig,
    repository: GameRepository,
) -> Result<()> {
    let script = ReplayScript::from_file(script)
        .with_context(|| format!("Failed to load replay script {}", script.display()))?;
    repository.run_migrations()?;

    let report = replay(&script, config, |broadcaster| {
        Collaborators::from_repository(repository, broadcaster)
    })?;

    for line in &report.lines {
        println!("{}", serde_json::to_string(line)?);
    }
    for failure in &report.effect_failures {
        eprintln!("side effect failed: {} ({})", failure.effect(), failure.error());
    }
    info!(
        lines = report.lines.len(),
        game_over = report.final_state.game_over(),
        "Replay finished"
    );
    Ok(())
}
