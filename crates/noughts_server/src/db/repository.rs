//! SQLite repository backing bans, leaderboards, history, and chat.

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::MigrationHarness;
use tracing::{debug, info, instrument, warn};

use crate::db::{
    ChatMessage, GameOutcome, LeaderboardEntry, LeaderboardRecord, MIGRATIONS, MatchRecord,
    NewChatMessage, NewMatchRecord, NewPlayerStatus, PlayerStats, StoreError, StoreErrorKind,
    schema,
};
use crate::store::{BanList, Leaderboard, LeaderboardId, MatchArchive};

/// Milliseconds a connection waits on a locked database before failing.
const BUSY_TIMEOUT_MS: u32 = 2_000;

/// Database repository shared by every match on the server.
///
/// Opens a fresh connection per operation, so a single instance can be
/// cloned into as many sessions as needed.
#[derive(Debug, Clone)]
pub struct GameRepository {
    db_path: String,
}

impl GameRepository {
    /// Creates a repository for the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, StoreError> {
        if db_path.trim().is_empty() {
            return Err(StoreError::invalid("Database path is empty"));
        }
        info!(path = %db_path, "Creating GameRepository");
        Ok(Self { db_path })
    }

    /// Establishes a database connection with a bounded lock wait.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, StoreError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path).map_err(|e| {
            StoreError::with_kind(
                StoreErrorKind::Connection,
                format!("Failed to connect to '{}': {}", self.db_path, e),
            )
        })?;
        diesel::sql_query(format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS))
            .execute(&mut conn)?;
        Ok(conn)
    }

    /// Applies any pending embedded migrations. Returns how many ran.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<usize, StoreError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| {
                StoreError::with_kind(StoreErrorKind::Migration, format!("Migration failed: {}", e))
            })?;
        info!(count = applied.len(), "Migrations applied");
        Ok(applied.len())
    }

    /// Sets or clears the ban flag for a user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn set_banned(
        &self,
        user_id: &str,
        banned: bool,
        reason: Option<String>,
    ) -> Result<(), StoreError> {
        use schema::player_status::dsl;

        let mut conn = self.connection()?;
        let row = NewPlayerStatus::new(user_id.to_string(), banned, reason.clone());

        diesel::insert_into(dsl::player_status)
            .values(&row)
            .on_conflict(dsl::user_id)
            .do_update()
            .set((
                dsl::is_banned.eq(banned),
                dsl::reason.eq(reason),
                dsl::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)?;

        info!(user_id, banned, "Ban flag updated");
        Ok(())
    }

    /// Recorded games for a match, in round order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn match_history(&self, match_id: &str) -> Result<Vec<MatchRecord>, StoreError> {
        use schema::match_history::dsl;

        let mut conn = self.connection()?;
        let records = dsl::match_history
            .filter(dsl::match_id.eq(match_id))
            .order(dsl::round.asc())
            .select(MatchRecord::as_select())
            .load(&mut conn)?;

        debug!(match_id, count = records.len(), "Match history loaded");
        Ok(records)
    }

    /// Chat lines for a match, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn chat_transcript(&self, match_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        use schema::match_chat::dsl;

        let mut conn = self.connection()?;
        let lines = dsl::match_chat
            .filter(dsl::match_id.eq(match_id))
            .order(dsl::id.asc())
            .select(ChatMessage::as_select())
            .load(&mut conn)?;

        debug!(match_id, count = lines.len(), "Chat transcript loaded");
        Ok(lines)
    }

    /// Cumulative totals for a user. Returns `None` if the user never
    /// finished a game.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn player_stats(&self, user_id: &str) -> Result<Option<PlayerStats>, StoreError> {
        use schema::player_stats::dsl;

        let mut conn = self.connection()?;
        let stats = dsl::player_stats
            .find(user_id)
            .select(PlayerStats::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(stats)
    }

    #[instrument(skip(self, conn))]
    fn current_score(
        &self,
        conn: &mut SqliteConnection,
        board: LeaderboardId,
        owner_id: &str,
    ) -> Result<i64, StoreError> {
        use schema::leaderboard_records::dsl;

        let score = dsl::leaderboard_records
            .find((board.as_ref(), owner_id))
            .select(dsl::score)
            .first::<i64>(conn)?;
        Ok(score)
    }
}

impl BanList for GameRepository {
    #[instrument(skip(self))]
    fn is_banned(&self, user_id: &str) -> Result<bool, StoreError> {
        use schema::player_status::dsl;

        let mut conn = self.connection()?;
        let banned = dsl::player_status
            .find(user_id)
            .select(dsl::is_banned)
            .first::<bool>(&mut conn)
            .optional()?;

        Ok(banned.unwrap_or(false))
    }
}

impl Leaderboard for GameRepository {
    #[instrument(skip(self))]
    fn increment(
        &self,
        board: LeaderboardId,
        owner_id: &str,
        username: &str,
        delta: i64,
    ) -> Result<i64, StoreError> {
        use schema::leaderboard_records::dsl;

        let mut conn = self.connection()?;
        conn.transaction(|conn| {
            diesel::insert_into(dsl::leaderboard_records)
                .values((
                    dsl::leaderboard_id.eq(board.as_ref()),
                    dsl::owner_id.eq(owner_id),
                    dsl::username.eq(username),
                    dsl::score.eq(delta),
                ))
                .on_conflict((dsl::leaderboard_id, dsl::owner_id))
                .do_update()
                .set((
                    dsl::score.eq(dsl::score + delta),
                    dsl::username.eq(username),
                    dsl::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)?;
            let score = self.current_score(conn, board, owner_id)?;
            debug!(%board, owner_id, score, "Leaderboard incremented");
            Ok(score)
        })
    }

    #[instrument(skip(self))]
    fn set_score(
        &self,
        board: LeaderboardId,
        owner_id: &str,
        username: &str,
        score: i64,
    ) -> Result<i64, StoreError> {
        use schema::leaderboard_records::dsl;

        let mut conn = self.connection()?;
        diesel::insert_into(dsl::leaderboard_records)
            .values((
                dsl::leaderboard_id.eq(board.as_ref()),
                dsl::owner_id.eq(owner_id),
                dsl::username.eq(username),
                dsl::score.eq(score),
            ))
            .on_conflict((dsl::leaderboard_id, dsl::owner_id))
            .do_update()
            .set((
                dsl::score.eq(score),
                dsl::username.eq(username),
                dsl::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)?;

        debug!(%board, owner_id, score, "Leaderboard score set");
        Ok(score)
    }

    #[instrument(skip(self))]
    fn top(&self, board: LeaderboardId, limit: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
        use schema::leaderboard_records::dsl;

        let mut conn = self.connection()?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let records = dsl::leaderboard_records
            .filter(dsl::leaderboard_id.eq(board.as_ref()))
            .order((dsl::score.desc(), dsl::updated_at.asc(), dsl::owner_id.asc()))
            .limit(limit)
            .select(LeaderboardRecord::as_select())
            .load(&mut conn)?;

        let entries: Vec<_> = records
            .into_iter()
            .zip(1..)
            .map(|(record, rank)| {
                LeaderboardEntry::new(
                    record.owner_id().clone(),
                    record.username().clone(),
                    *record.score(),
                    rank,
                )
            })
            .collect();

        info!(%board, count = entries.len(), "Leaderboard fetched");
        Ok(entries)
    }
}

impl MatchArchive for GameRepository {
    #[instrument(skip(self, record), fields(match_id = %record.match_id(), round = record.round()))]
    fn record_match(&self, record: &NewMatchRecord) -> Result<bool, StoreError> {
        let mut conn = self.connection()?;
        let inserted = diesel::insert_or_ignore_into(schema::match_history::table)
            .values(record)
            .execute(&mut conn)?;

        if inserted == 0 {
            warn!("Match already recorded, skipping");
        } else {
            info!(winner = ?record.winner_id(), "Match recorded");
        }
        Ok(inserted > 0)
    }

    #[instrument(skip(self, chat), fields(match_id = %chat.match_id(), user_id = %chat.user_id()))]
    fn record_chat(&self, chat: &NewChatMessage) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        diesel::insert_into(schema::match_chat::table)
            .values(chat)
            .execute(&mut conn)?;
        debug!("Chat line stored");
        Ok(())
    }

    #[instrument(skip(self))]
    fn record_player_result(&self, user_id: &str, outcome: GameOutcome) -> Result<(), StoreError> {
        use schema::player_stats::dsl;

        let (wins, losses, draws) = match outcome {
            GameOutcome::Win => (1, 0, 0),
            GameOutcome::Loss => (0, 1, 0),
            GameOutcome::Draw => (0, 0, 1),
        };

        let mut conn = self.connection()?;
        diesel::insert_into(dsl::player_stats)
            .values((
                dsl::user_id.eq(user_id),
                dsl::total_wins.eq(wins),
                dsl::total_losses.eq(losses),
                dsl::total_draws.eq(draws),
            ))
            .on_conflict(dsl::user_id)
            .do_update()
            .set((
                dsl::total_wins.eq(dsl::total_wins + wins),
                dsl::total_losses.eq(dsl::total_losses + losses),
                dsl::total_draws.eq(dsl::total_draws + draws),
                dsl::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)?;

        debug!(outcome = outcome.to_db_string(), "Player totals updated");
        Ok(())
    }
}
