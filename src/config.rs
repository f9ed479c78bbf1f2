//! Model constants
//!
//! Every hand-tuned number the pipeline uses lives in [`ModelConfig`]. The
//! defaults are the calibrated values; recalibration means loading a JSON
//! table with overrides, never changing the pipeline structure.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// League-average defensive rating used when the opponent cannot be resolved
pub const LEAGUE_DEF_RATING: f64 = 112.0;
/// League-average pace used when the opponent cannot be resolved
pub const LEAGUE_PACE: f64 = 99.0;
/// League-average points allowed used when the opponent cannot be resolved
pub const LEAGUE_PTS_ALLOWED: f64 = 112.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read model config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse model config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid model config: {0}")]
    Invalid(String),
}

/// Full constant table for one analysis pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Most-recent-first weights for the weighted recent average
    pub trend_weights: Vec<f64>,
    /// Games used for the standard deviation estimate
    pub variance_window: usize,
    /// Below this many games the default std dev is used
    pub min_variance_games: usize,
    pub default_std_dev: f64,
    /// Lower bound applied to std dev before simulating
    pub min_std_dev: f64,
    /// Size of the recent game window handed to the feature extractor
    pub recent_window: usize,
    pub recent_avg_window: usize,
    pub hot_cold_window: usize,
    pub minutes_window: usize,

    pub defense_baseline: f64,
    pub defense_scale: f64,
    pub pace_baseline: f64,
    pub pace_scale: f64,
    pub hot_cold_scale: f64,
    pub home_multiplier: f64,
    pub away_multiplier: f64,

    /// Std dev inflation accounting for model uncertainty
    pub simulation_widening: f64,
    pub sample_count: usize,

    /// Fraction of the Kelly stake to recommend (0.25 = quarter Kelly)
    pub kelly_multiplier: f64,
    pub min_edge: f64,
    pub confidence_scale: f64,
    pub max_confidence: f64,

    pub league_def_rating: f64,
    pub league_pace: f64,
    pub league_pts_allowed: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            trend_weights: vec![0.35, 0.25, 0.20, 0.15, 0.05],
            variance_window: 10,
            min_variance_games: 3,
            default_std_dev: 5.0,
            min_std_dev: 0.01,
            recent_window: 15,
            recent_avg_window: 10,
            hot_cold_window: 3,
            minutes_window: 5,
            defense_baseline: 115.0,
            defense_scale: 0.1,
            pace_baseline: 99.0,
            pace_scale: 0.05,
            hot_cold_scale: 0.5,
            home_multiplier: 1.02,
            away_multiplier: 0.98,
            simulation_widening: 1.1,
            sample_count: 10_000,
            kelly_multiplier: 0.25,
            min_edge: 0.05,
            confidence_scale: 10.0,
            max_confidence: 5.0,
            league_def_rating: LEAGUE_DEF_RATING,
            league_pace: LEAGUE_PACE,
            league_pts_allowed: LEAGUE_PTS_ALLOWED,
        }
    }
}

impl ModelConfig {
    /// Load a constant table from JSON; absent fields keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: ModelConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trend_weights.is_empty() {
            return Err(ConfigError::Invalid("trend_weights must not be empty".into()));
        }
        if self.trend_weights.iter().any(|w| !w.is_finite() || *w < 0.0)
            || self.trend_weights.iter().sum::<f64>() <= 0.0
        {
            return Err(ConfigError::Invalid(
                "trend_weights must be non-negative with a positive sum".into(),
            ));
        }
        if self.min_variance_games < 2 {
            return Err(ConfigError::Invalid(
                "min_variance_games must be at least 2 for a sample std dev".into(),
            ));
        }
        if self.variance_window < self.min_variance_games {
            return Err(ConfigError::Invalid(
                "variance_window must be >= min_variance_games".into(),
            ));
        }
        if self.recent_window == 0
            || self.recent_avg_window == 0
            || self.hot_cold_window == 0
            || self.minutes_window == 0
        {
            return Err(ConfigError::Invalid("game windows must be positive".into()));
        }
        if self.sample_count == 0 {
            return Err(ConfigError::Invalid("sample_count must be positive".into()));
        }
        if self.min_std_dev <= 0.0 || self.default_std_dev <= 0.0 {
            return Err(ConfigError::Invalid("std dev floors must be positive".into()));
        }
        if self.simulation_widening <= 0.0 {
            return Err(ConfigError::Invalid("simulation_widening must be positive".into()));
        }
        if self.kelly_multiplier < 0.0 || self.min_edge < 0.0 {
            return Err(ConfigError::Invalid(
                "kelly_multiplier and min_edge must be non-negative".into(),
            ));
        }
        if self.home_multiplier <= 0.0 || self.away_multiplier <= 0.0 {
            return Err(ConfigError::Invalid("location multipliers must be positive".into()));
        }
        if [self.max_confidence, self.confidence_scale]
            .iter()
            .any(|v| v.is_nan() || *v < 0.0)
        {
            return Err(ConfigError::Invalid(
                "max_confidence and confidence_scale must be non-negative".into(),
            ));
        }
        Ok(())
    }
}
