//! Feature Engineering
//!
//! Build a player's feature vector from the recent window (trend and
//! volatility) and the full season window (baseline). The two windows are
//! kept separate so the season average is never computed over the
//! truncated recent sample.

use tracing::debug;

use crate::config::ModelConfig;
use crate::core::trend::{mean, TrendEstimator};
use crate::data::GameLogSource;
use crate::error::AnalysisError;
use crate::models::{FeatureVector, GameRecord, Location, OpponentDefenseProfile, StatType};

/// Per-game target stat values, preserving game order
pub fn target_values(games: &[GameRecord], stat: StatType) -> Vec<f64> {
    games.iter().map(|g| stat.value(g)).collect()
}

fn head(values: &[f64], n: usize) -> &[f64] {
    &values[..values.len().min(n)]
}

/// Feature extractor for prop analysis
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    trend: TrendEstimator,
    recent_window: usize,
    recent_avg_window: usize,
    hot_cold_window: usize,
    minutes_window: usize,
}

impl FeatureExtractor {
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            trend: TrendEstimator::from_config(config),
            recent_window: config.recent_window,
            recent_avg_window: config.recent_avg_window,
            hot_cold_window: config.hot_cold_window,
            minutes_window: config.minutes_window,
        }
    }

    /// Number of most recent games treated as the recent window
    pub fn recent_window(&self) -> usize {
        self.recent_window
    }

    pub fn trend(&self) -> &TrendEstimator {
        &self.trend
    }

    /// Create the feature vector
    ///
    /// # Arguments
    /// * `recent` - Recent games, most recent first
    /// * `season` - Every game of the season, most recent first
    /// * `stat` - Target stat selector
    /// * `location` - Home or away for the upcoming game
    /// * `opponent` - Opponent defense (real or league-average fallback)
    pub fn extract(
        &self,
        recent: &[GameRecord],
        season: &[GameRecord],
        stat: StatType,
        location: Location,
        opponent: &OpponentDefenseProfile,
    ) -> Result<FeatureVector, AnalysisError> {
        if season.is_empty() {
            return Err(AnalysisError::insufficient("season window", 1, 0));
        }
        if recent.is_empty() {
            return Err(AnalysisError::insufficient("recent window", 1, 0));
        }

        let recent_values = target_values(recent, stat);
        let season_values = target_values(season, stat);

        let recent_avg_5 = self.trend.weighted_recent_average(&recent_values)?;
        let recent_avg_10 = mean(head(&recent_values, self.recent_avg_window))
            .ok_or_else(|| AnalysisError::insufficient("recent average", 1, 0))?;
        let season_avg = mean(&season_values)
            .ok_or_else(|| AnalysisError::insufficient("season window", 1, 0))?;
        let std_dev = self.trend.std_dev(&recent_values);

        let minutes: Vec<f64> = recent
            .iter()
            .take(self.minutes_window)
            .map(|g| g.minutes)
            .collect();
        let recent_min_avg = mean(&minutes).unwrap_or(0.0);

        // Form indicator (last few games vs season average)
        let recent_form = mean(head(&recent_values, self.hot_cold_window))
            .ok_or_else(|| AnalysisError::insufficient("recent form", 1, 0))?;
        let hot_cold_factor = (recent_form - season_avg) / (std_dev + 1.0);

        debug!(
            stat = %stat,
            recent_games = recent.len(),
            season_games = season.len(),
            recent_avg_5,
            season_avg,
            std_dev,
            hot_cold_factor,
            "Features extracted"
        );

        Ok(FeatureVector {
            stat_type: stat,
            recent_avg_5,
            recent_avg_10,
            season_avg,
            games_played: season.len(),
            std_dev,
            recent_min_avg,
            location,
            opp_def_rating: opponent.def_rating,
            opp_pace: opponent.pace,
            opp_pts_allowed: opponent.pts_allowed,
            opp_abbreviation: opponent.abbreviation.clone(),
            opp_full_name: opponent.full_name.clone(),
            opp_is_fallback: opponent.is_fallback,
            hot_cold_factor,
        })
    }

    /// Look the player up and extract features from their season
    ///
    /// Returns the features along with the season games used.
    pub fn extract_for_player<G: GameLogSource + ?Sized>(
        &self,
        source: &G,
        player: &str,
        stat: StatType,
        location: Location,
        opponent: &OpponentDefenseProfile,
    ) -> Result<(FeatureVector, Vec<GameRecord>), AnalysisError> {
        let season = source
            .player_games(player)
            .ok_or_else(|| AnalysisError::PlayerNotFound(player.to_string()))?;
        let recent = &season[..season.len().min(self.recent_window)];

        let features = self.extract(recent, &season, stat, location, opponent)?;
        Ok((features, season))
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::from_config(&ModelConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::teams::LeagueAverages;
    use crate::models::fixtures::{game, games_with_points};

    fn opponent() -> OpponentDefenseProfile {
        OpponentDefenseProfile {
            team_id: Some(1610612738),
            abbreviation: "BOS".to_string(),
            full_name: "Boston Celtics".to_string(),
            def_rating: 110.5,
            pace: 97.2,
            pts_allowed: 107.4,
            is_fallback: false,
        }
    }

    #[test]
    fn test_combined_stat_target_values() {
        let games = vec![game(2, 20, 10, 3), game(1, 22, 8, 4)];
        assert_eq!(target_values(&games, StatType::PtsRebs), vec![30.0, 30.0]);
        assert_eq!(target_values(&games, StatType::PtsAsts), vec![23.0, 26.0]);
    }

    #[test]
    fn test_season_avg_uses_full_window() {
        let points: Vec<u32> = (0..20).map(|i| 10 + i).collect();
        let season = games_with_points(&points);
        let extractor = FeatureExtractor::default();

        let recent = &season[..15];
        let features = extractor
            .extract(recent, &season, StatType::Points, Location::Home, &opponent())
            .unwrap();

        let hand_mean = points.iter().map(|&p| p as f64).sum::<f64>() / 20.0;
        assert!((features.season_avg - hand_mean).abs() < 1e-9);
        assert_eq!(features.games_played, 20);

        let truncated_mean = points[..15].iter().map(|&p| p as f64).sum::<f64>() / 15.0;
        assert!((features.season_avg - truncated_mean).abs() > 1.0);
    }

    #[test]
    fn test_feature_values() {
        let season = games_with_points(&[30, 25, 28, 22, 20, 18, 26, 24, 21, 23, 19, 27]);
        let features = FeatureExtractor::default()
            .extract(&season, &season, StatType::Points, Location::Away, &opponent())
            .unwrap();

        assert_eq!(features.games_played, 12);
        assert!((features.recent_avg_5 - 26.65).abs() < 1e-9);
        let first_ten = [30.0, 25.0, 28.0, 22.0, 20.0, 18.0, 26.0, 24.0, 21.0, 23.0];
        assert!((features.recent_avg_10 - first_ten.iter().sum::<f64>() / 10.0).abs() < 1e-9);
        assert!((features.recent_min_avg - 34.0).abs() < 1e-9);
        assert_eq!(features.location, Location::Away);
        assert_eq!(features.opp_abbreviation, "BOS");
        assert!((features.opp_def_rating - 110.5).abs() < 1e-9);

        let recent_3 = (30.0 + 25.0 + 28.0) / 3.0;
        let expected = (recent_3 - features.season_avg) / (features.std_dev + 1.0);
        assert!((features.hot_cold_factor - expected).abs() < 1e-9);
    }

    #[test]
    fn test_short_history_uses_default_std_dev() {
        let season = games_with_points(&[12, 18]);
        let extractor = FeatureExtractor::default();
        let features = extractor
            .extract(&season, &season, StatType::Points, Location::Home, &opponent())
            .unwrap();
        assert_eq!(features.std_dev, 5.0);
    }

    #[test]
    fn test_empty_season_is_insufficient() {
        let extractor = FeatureExtractor::default();
        let err = extractor
            .extract(&[], &[], StatType::Points, Location::Home, &opponent())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { available: 0, .. }));
    }

    #[test]
    fn test_fallback_profile_flows_into_features() {
        let season = games_with_points(&[20, 21, 22, 23]);
        let fallback = LeagueAverages::default().fallback_profile("XYZ", None);
        let features = FeatureExtractor::default()
            .extract(&season, &season, StatType::Points, Location::Home, &fallback)
            .unwrap();
        assert!(features.opp_is_fallback);
        assert_eq!(features.opp_def_rating, 112.0);
        assert_eq!(features.opp_pace, 99.0);
    }

    #[test]
    fn test_extract_for_unknown_player() {
        let index = crate::data::GameLogIndex::default();
        let err = FeatureExtractor::default()
            .extract_for_player(&index, "Nobody", StatType::Points, Location::Home, &opponent())
            .unwrap_err();
        assert_eq!(err, AnalysisError::PlayerNotFound("Nobody".to_string()));
    }
}
