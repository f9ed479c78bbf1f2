//! Monte Carlo outcome simulation
//!
//! Draws from N(prediction, max(std_dev, floor) * widening) and summarizes
//! the sample against the prop line. The random source is always supplied
//! by the caller so runs can be reproduced with a seeded RNG.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::config::ModelConfig;
use crate::error::AnalysisError;
use crate::models::SimulationResult;

#[derive(Debug, Clone)]
pub struct MonteCarloSimulator {
    sample_count: usize,
    widening: f64,
    min_std_dev: f64,
}

impl MonteCarloSimulator {
    /// `sample_count` of zero is raised to one
    pub fn new(sample_count: usize, widening: f64, min_std_dev: f64) -> Self {
        Self {
            sample_count: sample_count.max(1),
            widening,
            min_std_dev,
        }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(
            config.sample_count,
            config.simulation_widening,
            config.min_std_dev,
        )
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Std dev actually used for sampling
    pub fn effective_std_dev(&self, std_dev: f64) -> f64 {
        std_dev.max(self.min_std_dev) * self.widening
    }

    pub fn run<R: Rng + ?Sized>(
        &self,
        prediction: f64,
        std_dev: f64,
        prop_line: f64,
        rng: &mut R,
    ) -> Result<SimulationResult, AnalysisError> {
        let sigma = self.effective_std_dev(std_dev);
        let normal = Normal::new(prediction, sigma).map_err(|_| {
            AnalysisError::InvalidDistribution {
                mean: prediction,
                std_dev: sigma,
            }
        })?;
        if !prediction.is_finite() {
            return Err(AnalysisError::InvalidDistribution {
                mean: prediction,
                std_dev: sigma,
            });
        }

        let samples: Vec<f64> = (0..self.sample_count)
            .map(|_| normal.sample(&mut *rng))
            .collect();

        // Ties at the line count toward the under
        let over_count = samples.iter().filter(|&&s| s > prop_line).count();
        let over_probability = over_count as f64 / self.sample_count as f64;
        let under_probability = 1.0 - over_probability;

        let expected_value = samples.iter().sum::<f64>() / self.sample_count as f64;

        let mut sorted = samples.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let median_value = percentile(&sorted, 50.0);
        let ci_95_lower = percentile(&sorted, 2.5);
        let ci_95_upper = percentile(&sorted, 97.5);

        debug!(
            prediction,
            sigma,
            prop_line,
            over_probability,
            samples = self.sample_count,
            "Simulation complete"
        );

        Ok(SimulationResult {
            over_probability,
            under_probability,
            expected_value,
            median_value,
            ci_95_lower,
            ci_95_upper,
            samples,
        })
    }
}

impl Default for MonteCarloSimulator {
    fn default() -> Self {
        Self::from_config(&ModelConfig::default())
    }
}

/// Percentile of an ascending slice, linearly interpolated between ranks
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = (q.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_over_probability_matches_normal_cdf() {
        // P(X > 24.5) for X ~ N(25.0, 5.0 * 1.1)
        let analytic = 0.536_217_586_7;
        let sim = MonteCarloSimulator::new(9_000, 1.1, 0.01);
        let mut rng = StdRng::seed_from_u64(42);
        let result = sim.run(25.0, 5.0, 24.5, &mut rng).unwrap();

        assert!(
            (result.over_probability - analytic).abs() < 0.03,
            "over_probability {} too far from {}",
            result.over_probability,
            analytic
        );
    }

    #[test]
    fn test_probabilities_sum_to_one_exactly() {
        let sim = MonteCarloSimulator::new(1_000, 1.1, 0.01);
        for seed in 0..25u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let line = 10.0 + seed as f64;
            let result = sim.run(20.0, 4.0, line, &mut rng).unwrap();
            assert_eq!(result.over_probability + result.under_probability, 1.0);
        }
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let sim = MonteCarloSimulator::default();
        let a = sim.run(22.0, 6.0, 21.5, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = sim.run(22.0, 6.0, 21.5, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a.over_probability, b.over_probability);
        assert_eq!(a.samples, b.samples);
        assert_eq!(a.samples.len(), 10_000);
    }

    #[test]
    fn test_summary_statistics() {
        let sim = MonteCarloSimulator::default();
        let mut rng = StdRng::seed_from_u64(11);
        let result = sim.run(30.0, 5.0, 30.0, &mut rng).unwrap();

        assert!((result.expected_value - 30.0).abs() < 0.3);
        assert!((result.median_value - 30.0).abs() < 0.3);
        // 1.96 * 5.5 ≈ 10.78
        assert!((result.ci_95_lower - (30.0 - 10.78)).abs() < 0.6);
        assert!((result.ci_95_upper - (30.0 + 10.78)).abs() < 0.6);
        assert!(result.ci_95_lower < result.median_value);
        assert!(result.median_value < result.ci_95_upper);
    }

    #[test]
    fn test_zero_std_dev_is_floored() {
        let sim = MonteCarloSimulator::default();
        let mut rng = StdRng::seed_from_u64(3);
        let result = sim.run(12.0, 0.0, 11.5, &mut rng).unwrap();

        assert!((sim.effective_std_dev(0.0) - 0.011).abs() < 1e-12);
        assert_eq!(result.over_probability, 1.0);
        assert_eq!(result.under_probability, 0.0);
    }

    #[test]
    fn test_tie_at_line_counts_under() {
        // Spread far below one ulp of 12.0, so every sample lands exactly on the line
        let sim = MonteCarloSimulator::new(500, 1.0, 1e-300);
        let mut rng = StdRng::seed_from_u64(5);
        let result = sim.run(12.0, 0.0, 12.0, &mut rng).unwrap();
        assert!(result.samples.iter().all(|&s| s == 12.0));
        assert_eq!(result.over_probability, 0.0);
        assert_eq!(result.under_probability, 1.0);
    }

    #[test]
    fn test_non_finite_prediction_fails() {
        let sim = MonteCarloSimulator::default();
        let mut rng = StdRng::seed_from_u64(1);
        let err = sim.run(f64::NAN, 5.0, 10.0, &mut rng).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidDistribution { .. }));
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 100.0), 4.0);
        assert!((percentile(&sorted, 50.0) - 2.5).abs() < 1e-12);
        assert!((percentile(&sorted, 2.5) - 1.075).abs() < 1e-12);
        assert!(percentile(&[], 50.0).is_nan());
    }
}
