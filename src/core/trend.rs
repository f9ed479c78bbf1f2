//! Recent-form and volatility statistics
//!
//! Inputs are per-game stat values ordered most-recent-first.

use crate::config::ModelConfig;
use crate::error::AnalysisError;

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator)
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Weighted recent average and variance estimation
#[derive(Debug, Clone)]
pub struct TrendEstimator {
    weights: Vec<f64>,
    variance_window: usize,
    min_variance_games: usize,
    default_std_dev: f64,
}

impl TrendEstimator {
    pub fn new(
        weights: Vec<f64>,
        variance_window: usize,
        min_variance_games: usize,
        default_std_dev: f64,
    ) -> Self {
        Self {
            weights,
            variance_window,
            min_variance_games,
            default_std_dev,
        }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(
            config.trend_weights.clone(),
            config.variance_window,
            config.min_variance_games,
            config.default_std_dev,
        )
    }

    /// Weighted mean of the most recent games
    ///
    /// With fewer games than weights the schedule is truncated and
    /// renormalized to sum to 1.
    pub fn weighted_recent_average(&self, values: &[f64]) -> Result<f64, AnalysisError> {
        let n = values.len().min(self.weights.len());
        if n == 0 {
            return Err(AnalysisError::insufficient("weighted recent average", 1, 0));
        }

        let weights = &self.weights[..n];
        let weight_sum: f64 = weights.iter().sum();
        if weight_sum <= 0.0 {
            return Err(AnalysisError::insufficient(
                "weighted recent average (all available weights are zero)",
                self.weights.iter().position(|w| *w > 0.0).map_or(1, |i| i + 1),
                n,
            ));
        }

        let weighted: f64 = values.iter().zip(weights).map(|(v, w)| v * w).sum();
        Ok(weighted / weight_sum)
    }

    /// Standard deviation over the variance window
    ///
    /// Falls back to the default std dev when fewer than the minimum
    /// number of games is available.
    pub fn std_dev(&self, values: &[f64]) -> f64 {
        let window = &values[..values.len().min(self.variance_window)];
        if window.len() < self.min_variance_games {
            return self.default_std_dev;
        }
        sample_std_dev(window).unwrap_or(self.default_std_dev)
    }
}

impl Default for TrendEstimator {
    fn default() -> Self {
        Self::from_config(&ModelConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_average_full_schedule() {
        let trend = TrendEstimator::default();
        let avg = trend
            .weighted_recent_average(&[30.0, 25.0, 28.0, 22.0, 20.0])
            .unwrap();
        assert!((avg - 26.65).abs() < 1e-9, "got {}", avg);
    }

    #[test]
    fn test_weighted_average_ignores_older_games() {
        let trend = TrendEstimator::default();
        let avg = trend
            .weighted_recent_average(&[30.0, 25.0, 28.0, 22.0, 20.0, 100.0, 100.0])
            .unwrap();
        assert!((avg - 26.65).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_average_truncated_schedule() {
        let trend = TrendEstimator::default();
        // (30*0.35 + 20*0.25) / 0.60
        let avg = trend.weighted_recent_average(&[30.0, 20.0]).unwrap();
        assert!((avg - 15.5 / 0.6).abs() < 1e-9);

        let single = trend.weighted_recent_average(&[17.0]).unwrap();
        assert!((single - 17.0).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_average_empty_fails() {
        let trend = TrendEstimator::default();
        let err = trend.weighted_recent_average(&[]).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { available: 0, .. }));
    }

    #[test]
    fn test_weighted_average_zero_is_valid_output() {
        let trend = TrendEstimator::default();
        assert_eq!(trend.weighted_recent_average(&[0.0, 0.0, 0.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_std_dev_sample_formula() {
        let trend = TrendEstimator::default();
        // mean 4, squared deviations 4+0+4 = 8, / (3-1) = 4
        assert!((trend.std_dev(&[2.0, 4.0, 6.0]) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_std_dev_uses_window() {
        let trend = TrendEstimator::default();
        let mut values = vec![10.0; 10];
        values.extend([100.0, -100.0]);
        assert_eq!(trend.std_dev(&values), 0.0);
    }

    #[test]
    fn test_std_dev_default_when_short() {
        let trend = TrendEstimator::default();
        assert_eq!(trend.std_dev(&[]), 5.0);
        assert_eq!(trend.std_dev(&[10.0, 30.0]), 5.0);
    }

    #[test]
    fn test_mean_helpers() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(sample_std_dev(&[1.0]), None);
    }
}
