//! Persistence error type.

use derive_more::{Display, Error};
use serde::Serialize;

/// What part of a store call went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StoreErrorKind {
    /// The collaborator could not be reached or refused the call.
    Unavailable,
    /// A database connection could not be opened.
    Connection,
    /// A statement failed after connecting.
    Query,
    /// An embedded migration failed.
    Migration,
    /// The caller passed something the store cannot hold.
    InvalidInput,
}

impl StoreErrorKind {
    /// True when repeating the same call later may succeed.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Unavailable | Self::Connection)
    }
}

/// Failure of a persistence collaborator (ban list, leaderboard, archive),
/// tagged with its kind and the source location that raised it.
#[derive(Debug, Clone, Display, Error)]
#[display("{} store error: {} at {}:{}", kind, message, file, line)]
pub struct StoreError {
    /// Failure category.
    pub kind: StoreErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StoreError {
    /// Creates an error of the given kind with caller location tracking.
    #[track_caller]
    pub fn with_kind(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// A collaborator that could not serve the call.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_kind(StoreErrorKind::Unavailable, message)
    }

    /// Rejected input.
    #[track_caller]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::with_kind(StoreErrorKind::InvalidInput, message)
    }
}

impl From<diesel::result::Error> for StoreError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        // SQLite reports a held lock as an unclassified database error.
        let kind = match &err {
            Error::DatabaseError(DatabaseErrorKind::Unknown, info)
                if info.message().contains("locked") =>
            {
                StoreErrorKind::Unavailable
            }
            _ => StoreErrorKind::Query,
        };
        Self::with_kind(kind, err.to_string())
    }
}

impl From<diesel::ConnectionError> for StoreError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::with_kind(StoreErrorKind::Connection, err.to_string())
    }
}
