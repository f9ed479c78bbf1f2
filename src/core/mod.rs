//! Core business logic modules

pub mod adjust;
pub mod kelly;
pub mod monte_carlo;
pub mod trend;

// Re-export commonly used types
pub use adjust::{PredictionAdjuster, PredictionBreakdown};
pub use kelly::{
    american_to_decimal, calculate_kelly_fraction, implied_probability, EdgeCalculator, SideQuote,
};
pub use monte_carlo::MonteCarloSimulator;
pub use trend::TrendEstimator;
