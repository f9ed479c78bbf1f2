use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AnalysisError;

/// Home or away for the game being analyzed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Location {
    Home,
    Away,
}

impl Location {
    pub fn is_home(self) -> bool {
        self == Location::Home
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Location::Home => "HOME",
            Location::Away => "AWAY",
        }
    }
}

impl FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HOME" | "H" => Ok(Location::Home),
            "AWAY" | "A" => Ok(Location::Away),
            other => Err(format!("Location must be HOME or AWAY, got {:?}", other)),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stat selector for the prop being analyzed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatType {
    #[serde(rename = "points")]
    Points,
    #[serde(rename = "rebounds")]
    Rebounds,
    #[serde(rename = "assists")]
    Assists,
    #[serde(rename = "threes")]
    Threes,
    #[serde(rename = "pts+rebs")]
    PtsRebs,
    #[serde(rename = "pts+asts")]
    PtsAsts,
    #[serde(rename = "rebs+asts")]
    RebsAsts,
}

impl StatType {
    pub const ALL: [StatType; 7] = [
        StatType::Points,
        StatType::Rebounds,
        StatType::Assists,
        StatType::Threes,
        StatType::PtsRebs,
        StatType::PtsAsts,
        StatType::RebsAsts,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatType::Points => "points",
            StatType::Rebounds => "rebounds",
            StatType::Assists => "assists",
            StatType::Threes => "threes",
            StatType::PtsRebs => "pts+rebs",
            StatType::PtsAsts => "pts+asts",
            StatType::RebsAsts => "rebs+asts",
        }
    }

    /// Per-game value of this stat; combined selectors sum their columns
    pub fn value(self, game: &GameRecord) -> f64 {
        let v = match self {
            StatType::Points => game.points,
            StatType::Rebounds => game.rebounds,
            StatType::Assists => game.assists,
            StatType::Threes => game.fg3m,
            StatType::PtsRebs => game.points + game.rebounds,
            StatType::PtsAsts => game.points + game.assists,
            StatType::RebsAsts => game.rebounds + game.assists,
        };
        v as f64
    }
}

impl FromStr for StatType {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        StatType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| AnalysisError::UnsupportedStatType(s.to_string()))
    }
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One historical game for a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_date: NaiveDate,
    pub matchup: String,
    pub location: Location,
    pub minutes: f64,
    pub points: u32,
    pub rebounds: u32,
    pub assists: u32,
    pub fga: u32,
    pub fgm: u32,
    pub fg3a: u32,
    pub fg3m: u32,
    pub fta: u32,
    pub ftm: u32,
    pub steals: u32,
    pub blocks: u32,
    pub turnovers: u32,
}

/// Opponent defensive aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentDefenseProfile {
    pub team_id: Option<u32>,
    pub abbreviation: String,
    pub full_name: String,
    pub def_rating: f64,
    pub pace: f64,
    pub pts_allowed: f64,
    /// League-average constants were substituted for some or all team numbers
    pub is_fallback: bool,
}

/// Hot/cold classification of recent form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormIndicator {
    Hot,
    Cold,
    Neutral,
}

impl FormIndicator {
    pub fn from_factor(hot_cold_factor: f64) -> Self {
        if hot_cold_factor > 0.5 {
            FormIndicator::Hot
        } else if hot_cold_factor < -0.5 {
            FormIndicator::Cold
        } else {
            FormIndicator::Neutral
        }
    }
}

impl fmt::Display for FormIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FormIndicator::Hot => "HOT",
            FormIndicator::Cold => "COLD",
            FormIndicator::Neutral => "NEUTRAL",
        };
        f.write_str(s)
    }
}

/// Model input for one prediction request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub stat_type: StatType,
    pub recent_avg_5: f64,
    pub recent_avg_10: f64,
    pub season_avg: f64,
    pub games_played: usize,
    pub std_dev: f64,
    pub recent_min_avg: f64,
    pub location: Location,
    pub opp_def_rating: f64,
    pub opp_pace: f64,
    pub opp_pts_allowed: f64,
    pub opp_abbreviation: String,
    pub opp_full_name: String,
    pub opp_is_fallback: bool,
    pub hot_cold_factor: f64,
}

impl FeatureVector {
    pub fn form(&self) -> FormIndicator {
        FormIndicator::from_factor(self.hot_cold_factor)
    }
}

/// Monte Carlo summary around a point prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub over_probability: f64,
    pub under_probability: f64,
    pub expected_value: f64,
    pub median_value: f64,
    pub ci_95_lower: f64,
    pub ci_95_upper: f64,
    /// Raw draws, kept for downstream rendering
    #[serde(skip)]
    pub samples: Vec<f64>,
}

impl SimulationResult {
    /// Bucket the samples into `bins` equal-width bins over their range
    pub fn histogram(&self, bins: usize) -> Vec<(f64, usize)> {
        if bins == 0 || self.samples.is_empty() {
            return Vec::new();
        }
        let min = self.samples.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = self.samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let width = ((max - min) / bins as f64).max(f64::EPSILON);

        let mut counts = vec![0usize; bins];
        for &s in &self.samples {
            let idx = (((s - min) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        counts
            .into_iter()
            .enumerate()
            .map(|(i, c)| (min + width * i as f64, c))
            .collect()
    }
}

/// Side chosen by the edge calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetSide {
    #[serde(rename = "OVER")]
    Over,
    #[serde(rename = "UNDER")]
    Under,
    #[serde(rename = "NO_BET")]
    NoBet,
}

impl fmt::Display for BetSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BetSide::Over => "OVER",
            BetSide::Under => "UNDER",
            BetSide::NoBet => "NO BET",
        };
        f.write_str(s)
    }
}

/// Terminal output of the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BettingRecommendation {
    pub predicted_value: f64,
    pub prop_line: f64,
    pub over_probability: f64,
    pub under_probability: f64,
    pub edge_over: f64,
    pub edge_under: f64,
    pub kelly_over: f64,
    pub kelly_under: f64,
    pub bet: BetSide,
    /// 0 to 5
    pub confidence: f64,
    pub edge: f64,
    /// Fraction of bankroll
    pub kelly_size: f64,
    /// Opponent strength fell back to league-average constants
    pub opponent_fallback: bool,
}

impl BettingRecommendation {
    pub fn is_bet(&self) -> bool {
        self.bet != BetSide::NoBet
    }

    /// Stake for a bankroll, rounded down to whole cents
    pub fn stake_for_bankroll(&self, bankroll: f64) -> f64 {
        if bankroll <= 0.0 {
            return 0.0;
        }
        (bankroll * self.kelly_size * 100.0).floor() / 100.0
    }
}

/// One prop to analyze
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropRequest {
    pub player: String,
    pub opponent: String,
    pub stat_type: String,
    pub prop_line: f64,
    pub odds_over: i32,
    pub odds_under: i32,
    pub location: Location,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub players_loaded: usize,
    pub teams_loaded: usize,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
