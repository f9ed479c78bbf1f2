//! Edge and Kelly Criterion Bet Sizing
//!
//! Converts American odds to decimal odds and implied probabilities, then
//! compares them to simulated probabilities.
//!
//! For each side:
//!     decimal  = odds/100 + 1        (positive odds)
//!              = 100/|odds| + 1      (negative odds)
//!     implied  = 1 / decimal
//!     edge     = p_model - implied
//!     kelly    = max(0, multiplier * edge / (decimal - 1))

use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::error::{validate_american_odds, validate_probability, AnalysisError};
use crate::models::{BetSide, BettingRecommendation, SimulationResult};

/// Convert American odds to decimal odds
///
/// # Examples
/// ```
/// use propbet::core::kelly::american_to_decimal;
/// assert!((american_to_decimal(150).unwrap() - 2.5).abs() < 1e-12);
/// assert!((american_to_decimal(-200).unwrap() - 1.5).abs() < 1e-12);
/// assert!(american_to_decimal(0).is_err());
/// ```
pub fn american_to_decimal(odds: i32) -> Result<f64, AnalysisError> {
    validate_american_odds(odds)?;
    let odds = odds as f64;
    if odds > 0.0 {
        Ok(odds / 100.0 + 1.0)
    } else {
        Ok(100.0 / odds.abs() + 1.0)
    }
}

/// Probability implied by American odds, always in (0, 1)
pub fn implied_probability(odds: i32) -> Result<f64, AnalysisError> {
    Ok(1.0 / american_to_decimal(odds)?)
}

/// Fractional Kelly stake as a fraction of bankroll
///
/// Never negative: a negative edge sizes to zero.
pub fn calculate_kelly_fraction(edge: f64, decimal_odds: f64, kelly_multiplier: f64) -> f64 {
    if decimal_odds <= 1.0 {
        return 0.0;
    }
    let fraction = kelly_multiplier * edge / (decimal_odds - 1.0);
    if fraction.is_nan() {
        return 0.0;
    }
    fraction.max(0.0)
}

/// Pricing of one side of the prop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SideQuote {
    pub american_odds: i32,
    pub decimal_odds: f64,
    pub implied_probability: f64,
    pub model_probability: f64,
    pub edge: f64,
    pub kelly_fraction: f64,
}

/// Edge calculator producing the final recommendation
#[derive(Debug, Clone)]
pub struct EdgeCalculator {
    pub kelly_multiplier: f64,
    pub min_edge: f64,
    pub confidence_scale: f64,
    pub max_confidence: f64,
}

impl EdgeCalculator {
    pub fn new(
        kelly_multiplier: f64,
        min_edge: f64,
        confidence_scale: f64,
        max_confidence: f64,
    ) -> Self {
        Self {
            kelly_multiplier,
            min_edge,
            confidence_scale,
            max_confidence,
        }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(
            config.kelly_multiplier,
            config.min_edge,
            config.confidence_scale,
            config.max_confidence,
        )
    }

    /// Price one side against the model probability
    pub fn quote(&self, model_probability: f64, american_odds: i32) -> Result<SideQuote, AnalysisError> {
        let decimal_odds = american_to_decimal(american_odds)?;
        let implied = 1.0 / decimal_odds;
        let edge = model_probability - implied;

        Ok(SideQuote {
            american_odds,
            decimal_odds,
            implied_probability: implied,
            model_probability,
            edge,
            kelly_fraction: calculate_kelly_fraction(edge, decimal_odds, self.kelly_multiplier),
        })
    }

    /// Confidence on the 0-5 display scale
    pub fn confidence(&self, edge: f64) -> f64 {
        (edge * self.confidence_scale).max(0.0).min(self.max_confidence)
    }

    /// Pick a side
    ///
    /// A side is chosen only when its edge exceeds the minimum AND is
    /// strictly greater than the other side's edge.
    pub fn recommend(
        &self,
        over_probability: f64,
        under_probability: f64,
        odds_over: i32,
        odds_under: i32,
        predicted_value: f64,
        prop_line: f64,
    ) -> Result<BettingRecommendation, AnalysisError> {
        validate_probability(over_probability)?;
        validate_probability(under_probability)?;
        let over = self.quote(over_probability, odds_over)?;
        let under = self.quote(under_probability, odds_under)?;

        let (bet, edge, kelly_size) = if over.edge > self.min_edge && over.edge > under.edge {
            (BetSide::Over, over.edge, over.kelly_fraction)
        } else if under.edge > self.min_edge && under.edge > over.edge {
            (BetSide::Under, under.edge, under.kelly_fraction)
        } else {
            (BetSide::NoBet, over.edge.max(under.edge), 0.0)
        };

        let confidence = if bet == BetSide::NoBet {
            0.0
        } else {
            self.confidence(edge)
        };

        Ok(BettingRecommendation {
            predicted_value,
            prop_line,
            over_probability,
            under_probability,
            edge_over: over.edge,
            edge_under: under.edge,
            kelly_over: over.kelly_fraction,
            kelly_under: under.kelly_fraction,
            bet,
            confidence,
            edge,
            kelly_size,
            opponent_fallback: false,
        })
    }

    pub fn recommend_from_simulation(
        &self,
        simulation: &SimulationResult,
        odds_over: i32,
        odds_under: i32,
        predicted_value: f64,
        prop_line: f64,
    ) -> Result<BettingRecommendation, AnalysisError> {
        self.recommend(
            simulation.over_probability,
            simulation.under_probability,
            odds_over,
            odds_under,
            predicted_value,
            prop_line,
        )
    }
}

impl Default for EdgeCalculator {
    fn default() -> Self {
        Self::from_config(&ModelConfig::default())
    }
}
