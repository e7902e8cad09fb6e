//! Reasons the service turns a request down.

/// Why a player may not join a match.
///
/// Variants are listed in the order admission checks them.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum JoinRejection {
    /// Both seats are taken.
    #[display("match is full")]
    MatchFull,

    /// The candidate is on the ban list.
    #[display("player is banned")]
    Banned,

    /// The ban list could not be consulted and the policy is fail-closed.
    #[display("ban status unavailable")]
    BanStatusUnavailable,

    /// Candidate and match skill levels are too far apart.
    #[display("skill difference too high: {}", _0)]
    SkillGap(i32),

    /// The candidate asked for a different mode than the match plays.
    #[display("game mode mismatch")]
    ModeMismatch,

    /// Moves have already been made.
    #[display("game in progress")]
    GameInProgress,
}

impl std::error::Error for JoinRejection {}

/// Why a signal was refused.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum SignalError {
    /// The payload is not a valid signal object.
    #[display("invalid signal data: {}", _0)]
    Malformed(String),

    /// No `type` field.
    #[display("missing signal type")]
    MissingType,

    /// A `type` nobody handles.
    #[display("unknown signal type: {}", _0)]
    UnknownType(String),

    /// No `userId` field.
    #[display("missing userId")]
    MissingUserId,

    /// Rematch asked for before the game ended.
    #[display("game is still in progress")]
    GameInProgress,

    /// The sender is not seated in this match.
    #[display("player not found")]
    PlayerNotFound,

    /// The sender is seated but disconnected.
    #[display("player not connected")]
    PlayerNotConnected,

    /// Chat text is empty or too long.
    #[display("message must be between 1-{} characters", max)]
    MessageLength {
        /// Longest accepted message, in characters.
        max: usize,
    },
}

impl std::error::Error for SignalError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages() {
        assert_eq!(JoinRejection::MatchFull.to_string(), "match is full");
        assert_eq!(
            JoinRejection::SkillGap(25).to_string(),
            "skill difference too high: 25"
        );
        assert_eq!(
            SignalError::MessageLength { max: 500 }.to_string(),
            "message must be between 1-500 characters"
        );
        assert_eq!(SignalError::MissingUserId.to_string(), "missing userId");
    }
}
