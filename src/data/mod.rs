//! Data sources and feature engineering modules

pub mod features;
pub mod history;
pub mod teams;

use crate::models::{GameRecord, OpponentDefenseProfile};

// Re-export commonly used types
pub use features::{target_values, FeatureExtractor};
pub use history::GameLogIndex;
pub use teams::{opponent_profile, LeagueAverages, TeamDirectory, TeamIdentity, TeamRecord};

/// Game logs for named players
pub trait GameLogSource {
    /// Full season for the player, most recent game first
    ///
    /// `None` means the player identity could not be resolved.
    fn player_games(&self, player: &str) -> Option<Vec<GameRecord>>;

    fn player_count(&self) -> usize {
        0
    }
}

/// Opponent defensive aggregates for named teams
pub trait DefenseSource {
    /// Resolve a team string without requiring defensive numbers
    fn resolve_team(&self, team: &str) -> Option<TeamIdentity>;

    /// Defensive profile, `None` on any lookup failure
    fn defense_profile(&self, team: &str) -> Option<OpponentDefenseProfile>;

    fn team_count(&self) -> usize {
        0
    }
}
