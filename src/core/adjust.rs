//! Point prediction from a feature vector
//!
//! base = weighted 5-game average, then in fixed order:
//!     × defense factor   1 + ((baseline - def_rating) / 100) * defense_scale
//!     × pace factor      1 + ((pace - baseline) / 100) * pace_scale
//!     + hot/cold nudge   hot_cold_factor * hot_cold_scale
//!     × location factor  home or away multiplier

use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::models::{FeatureVector, Location};

/// Each step of one prediction, for auditing and display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionBreakdown {
    pub base: f64,
    pub defense_factor: f64,
    pub pace_factor: f64,
    pub hot_cold_nudge: f64,
    pub location_factor: f64,
    pub predicted: f64,
}

#[derive(Debug, Clone)]
pub struct PredictionAdjuster {
    defense_baseline: f64,
    defense_scale: f64,
    pace_baseline: f64,
    pace_scale: f64,
    hot_cold_scale: f64,
    home_multiplier: f64,
    away_multiplier: f64,
}

impl PredictionAdjuster {
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            defense_baseline: config.defense_baseline,
            defense_scale: config.defense_scale,
            pace_baseline: config.pace_baseline,
            pace_scale: config.pace_scale,
            hot_cold_scale: config.hot_cold_scale,
            home_multiplier: config.home_multiplier,
            away_multiplier: config.away_multiplier,
        }
    }

    pub fn defense_factor(&self, opp_def_rating: f64) -> f64 {
        1.0 + ((self.defense_baseline - opp_def_rating) / 100.0) * self.defense_scale
    }

    pub fn pace_factor(&self, opp_pace: f64) -> f64 {
        1.0 + ((opp_pace - self.pace_baseline) / 100.0) * self.pace_scale
    }

    pub fn location_factor(&self, location: Location) -> f64 {
        match location {
            Location::Home => self.home_multiplier,
            Location::Away => self.away_multiplier,
        }
    }

    pub fn breakdown(&self, features: &FeatureVector) -> PredictionBreakdown {
        let base = features.recent_avg_5;
        let defense_factor = self.defense_factor(features.opp_def_rating);
        let pace_factor = self.pace_factor(features.opp_pace);
        let hot_cold_nudge = features.hot_cold_factor * self.hot_cold_scale;
        let location_factor = self.location_factor(features.location);

        let mut predicted = base;
        predicted *= defense_factor;
        predicted *= pace_factor;
        predicted += hot_cold_nudge;
        predicted *= location_factor;

        PredictionBreakdown {
            base,
            defense_factor,
            pace_factor,
            hot_cold_nudge,
            location_factor,
            predicted,
        }
    }

    pub fn predict(&self, features: &FeatureVector) -> f64 {
        self.breakdown(features).predicted
    }
}

impl Default for PredictionAdjuster {
    fn default() -> Self {
        Self::from_config(&ModelConfig::default())
    }
}
