//! Join admission.

use std::collections::HashMap;

use tracing::{debug, info, instrument, warn};

use super::{GameService, JoinRejection};
use crate::config::BanPolicy;
use crate::session::SessionState;

/// Join metadata key carrying the candidate's skill level.
pub const SKILL_LEVEL_KEY: &str = "skill_level";

/// Join metadata key carrying the mode the candidate asked for.
pub const MODE_KEY: &str = "mode";

impl GameService {
    /// Decides whether `candidate_id` may take a seat.
    ///
    /// Checks run in a fixed order and the first failure is reported.
    ///
    /// # Errors
    ///
    /// Returns the first applicable [`JoinRejection`].
    #[instrument(skip(self, state, metadata), fields(match_id = %state.match_id()))]
    pub fn admit_join(
        &self,
        state: &SessionState,
        candidate_id: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<(), JoinRejection> {
        if state.is_full() {
            debug!("Rejecting join, match is full");
            return Err(JoinRejection::MatchFull);
        }

        match self.collaborators.bans.is_banned(candidate_id) {
            Ok(true) => {
                info!("Rejecting banned player");
                return Err(JoinRejection::Banned);
            }
            Ok(false) => {}
            Err(e) => match self.config.ban_policy() {
                BanPolicy::FailOpen => {
                    warn!(error = %e, "Ban lookup failed, admitting");
                }
                BanPolicy::FailClosed => {
                    warn!(error = %e, "Ban lookup failed, rejecting");
                    return Err(JoinRejection::BanStatusUnavailable);
                }
            },
        }

        // A skill of zero means "unrated" on either side.
        let candidate_skill = metadata
            .get(SKILL_LEVEL_KEY)
            .and_then(|raw| raw.trim().parse::<i32>().ok())
            .filter(|skill| *skill != 0);
        let match_skill = (*state.skill_level()).filter(|skill| *skill != 0);
        if let (Some(candidate), Some(required)) = (candidate_skill, match_skill) {
            let gap = candidate.abs_diff(required);
            if gap > self.config.max_skill_gap().unsigned_abs() {
                info!(candidate, required, gap, "Rejecting join, skill gap");
                return Err(JoinRejection::SkillGap(i32::try_from(gap).unwrap_or(i32::MAX)));
            }
        }

        let requested_mode = metadata
            .get(MODE_KEY)
            .map(|mode| mode.trim())
            .filter(|mode| !mode.is_empty());
        if let Some(requested) = requested_mode {
            if requested != state.mode().as_ref() {
                info!(requested = %requested, mode = %state.mode(), "Rejecting join, mode mismatch");
                return Err(JoinRejection::ModeMismatch);
            }
        }

        if *state.move_count() > 0 {
            debug!("Rejecting join, game in progress");
            return Err(JoinRejection::GameInProgress);
        }

        debug!("Join admitted");
        Ok(())
    }
}
