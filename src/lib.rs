//! Propbet - player prop betting analysis
//!
//! This library provides:
//! - Weighted recent-form trend and volatility estimation
//! - Opponent defense, pace, form and location adjustments
//! - Monte Carlo over/under probabilities
//! - Edge calculation and fractional Kelly bet sizing
//! - Game log and team directory loaders
//!
//! # Example
//!
//! ```no_run
//! use propbet::{GameLogIndex, Location, ModelConfig, PropAnalyzer, PropRequest, TeamDirectory};
//!
//! let games = GameLogIndex::load("data/game_logs.csv").unwrap();
//! let analyzer = PropAnalyzer::new(ModelConfig::default(), games, TeamDirectory::nba_teams());
//!
//! let request = PropRequest {
//!     player: "LeBron James".to_string(),
//!     opponent: "BOS".to_string(),
//!     stat_type: "points".to_string(),
//!     prop_line: 24.5,
//!     odds_over: -110,
//!     odds_under: -110,
//!     location: Location::Home,
//! };
//! let rec = analyzer.analyze_seeded(&request, 42).unwrap();
//! println!("{} (edge {:.3}, stake {:.2}%)", rec.bet, rec.edge, rec.kelly_size * 100.0);
//! ```

pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod models;
pub mod predictor;

// Re-export commonly used types
pub use config::ModelConfig;
pub use data::{DefenseSource, GameLogIndex, GameLogSource, TeamDirectory};
pub use error::AnalysisError;
pub use models::{
    BetSide, BettingRecommendation, FeatureVector, FormIndicator, GameRecord, Location,
    OpponentDefenseProfile, PropRequest, SimulationResult, StatType,
};
pub use predictor::{PropAnalysis, PropAnalyzer};
