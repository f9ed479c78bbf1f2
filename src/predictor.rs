//! Prop analysis pipeline
//!
//! trend/features -> adjusted prediction -> Monte Carlo -> edge and Kelly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ModelConfig;
use crate::core::{EdgeCalculator, MonteCarloSimulator, PredictionAdjuster, PredictionBreakdown};
use crate::data::{opponent_profile, DefenseSource, FeatureExtractor, GameLogSource, LeagueAverages};
use crate::error::{validate_american_odds, validate_prop_line, AnalysisError};
use crate::models::{
    BettingRecommendation, FeatureVector, GameRecord, PropRequest, SimulationResult, StatType,
};

/// Number of recent games returned with a detailed analysis
const DETAIL_GAMES: usize = 5;

/// Everything computed for one prop, for presentation layers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropAnalysis {
    pub request: PropRequest,
    pub features: FeatureVector,
    pub breakdown: PredictionBreakdown,
    pub simulation: SimulationResult,
    pub recommendation: BettingRecommendation,
    /// Most recent games, most recent first
    pub recent_games: Vec<GameRecord>,
}

/// Stateless analyzer over a game log source and a defense source
pub struct PropAnalyzer<G, D> {
    config: ModelConfig,
    games: G,
    teams: D,
    league: LeagueAverages,
    extractor: FeatureExtractor,
    adjuster: PredictionAdjuster,
    simulator: MonteCarloSimulator,
    edge: EdgeCalculator,
}

impl<G: GameLogSource, D: DefenseSource> PropAnalyzer<G, D> {
    pub fn new(config: ModelConfig, games: G, teams: D) -> Self {
        Self {
            league: LeagueAverages::from_config(&config),
            extractor: FeatureExtractor::from_config(&config),
            adjuster: PredictionAdjuster::from_config(&config),
            simulator: MonteCarloSimulator::from_config(&config),
            edge: EdgeCalculator::from_config(&config),
            config,
            games,
            teams,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn games(&self) -> &G {
        &self.games
    }

    pub fn teams(&self) -> &D {
        &self.teams
    }

    /// Analyze one prop with an entropy-seeded RNG
    pub fn analyze(&self, request: &PropRequest) -> Result<BettingRecommendation, AnalysisError> {
        let mut rng = StdRng::from_entropy();
        self.analyze_with_rng(request, &mut rng)
    }

    /// Analyze one prop reproducibly
    pub fn analyze_seeded(
        &self,
        request: &PropRequest,
        seed: u64,
    ) -> Result<BettingRecommendation, AnalysisError> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.analyze_with_rng(request, &mut rng)
    }

    pub fn analyze_with_rng<R: Rng + ?Sized>(
        &self,
        request: &PropRequest,
        rng: &mut R,
    ) -> Result<BettingRecommendation, AnalysisError> {
        self.analyze_detailed(request, rng)
            .map(|analysis| analysis.recommendation)
    }

    /// Run the full pipeline and keep every intermediate result
    pub fn analyze_detailed<R: Rng + ?Sized>(
        &self,
        request: &PropRequest,
        rng: &mut R,
    ) -> Result<PropAnalysis, AnalysisError> {
        // Caller errors fail before any data access
        let stat = request.stat_type.parse::<StatType>()?;
        validate_american_odds(request.odds_over)?;
        validate_american_odds(request.odds_under)?;
        validate_prop_line(request.prop_line)?;

        let opponent = opponent_profile(&self.teams, &request.opponent, &self.league);
        let (features, season) = self.extractor.extract_for_player(
            &self.games,
            &request.player,
            stat,
            request.location,
            &opponent,
        )?;

        let breakdown = self.adjuster.breakdown(&features);
        debug!(
            base = breakdown.base,
            defense = breakdown.defense_factor,
            pace = breakdown.pace_factor,
            location = breakdown.location_factor,
            predicted = breakdown.predicted,
            "Prediction adjusted"
        );

        let simulation =
            self.simulator
                .run(breakdown.predicted, features.std_dev, request.prop_line, rng)?;

        let mut recommendation = self.edge.recommend_from_simulation(
            &simulation,
            request.odds_over,
            request.odds_under,
            breakdown.predicted,
            request.prop_line,
        )?;
        recommendation.opponent_fallback = features.opp_is_fallback;

        info!(
            "{} {} {} vs {}: predicted {:.1}, P(over) {:.3}, {}",
            request.player,
            stat,
            request.prop_line,
            features.opp_abbreviation,
            recommendation.predicted_value,
            recommendation.over_probability,
            recommendation.bet
        );

        let recent_games = season.into_iter().take(DETAIL_GAMES).collect();

        Ok(PropAnalysis {
            request: request.clone(),
            features,
            breakdown,
            simulation,
            recommendation,
            recent_games,
        })
    }
}

impl<G, D> PropAnalyzer<G, D>
where
    G: GameLogSource + Sync,
    D: DefenseSource + Sync,
{
    /// Analyze independent requests in parallel
    ///
    /// Each request gets its own RNG seeded from `seed`, so results do not
    /// depend on thread scheduling.
    pub fn analyze_batch(
        &self,
        requests: &[PropRequest],
        seed: u64,
    ) -> Vec<Result<PropAnalysis, AnalysisError>> {
        self.analyze_batch_with(requests, seed, |_| {})
    }

    /// Same as [`analyze_batch`](Self::analyze_batch), calling `on_done`
    /// with the request index as each analysis finishes
    pub fn analyze_batch_with<F>(
        &self,
        requests: &[PropRequest],
        seed: u64,
        on_done: F,
    ) -> Vec<Result<PropAnalysis, AnalysisError>>
    where
        F: Fn(usize) + Sync,
    {
        let mut master = StdRng::seed_from_u64(seed);
        let seeds: Vec<u64> = requests.iter().map(|_| master.gen()).collect();

        let results: Vec<_> = requests
            .par_iter()
            .zip(seeds.par_iter())
            .enumerate()
            .map(|(i, (request, &request_seed))| {
                let mut rng = StdRng::seed_from_u64(request_seed);
                let result = self.analyze_detailed(request, &mut rng);
                on_done(i);
                result
            })
            .collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!("Batch analyzed {} props ({} failed)", results.len(), failed);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GameLogIndex, TeamDirectory, TeamIdentity, TeamRecord};
    use crate::models::fixtures::games_with_points;
    use crate::models::{BetSide, Location, OpponentDefenseProfile};
    use std::cell::Cell;

    const POINTS: [u32; 12] = [30, 25, 28, 22, 20, 18, 26, 24, 21, 23, 19, 27];

    fn analyzer() -> PropAnalyzer<GameLogIndex, TeamDirectory> {
        let games = GameLogIndex::from_records(
            games_with_points(&POINTS)
                .into_iter()
                .map(|g| ("LeBron James", g)),
        );
        let teams = TeamDirectory::from_records(vec![
            TeamRecord::new(1610612738, "BOS", "Boston Celtics", "Celtics", "Boston")
                .with_defense(110.5, 97.2, Some(107.4)),
            TeamRecord::new(1610612748, "MIA", "Miami Heat", "Heat", "Miami"),
        ]);
        PropAnalyzer::new(ModelConfig::default(), games, teams)
    }

    fn request(opponent: &str) -> PropRequest {
        PropRequest {
            player: "LeBron James".to_string(),
            opponent: opponent.to_string(),
            stat_type: "points".to_string(),
            prop_line: 24.5,
            odds_over: -110,
            odds_under: -110,
            location: Location::Home,
        }
    }

    /// Source that counts lookups and returns a fixed season
    struct CountingSource {
        games: Vec<GameRecord>,
        calls: Cell<usize>,
    }

    impl GameLogSource for CountingSource {
        fn player_games(&self, _player: &str) -> Option<Vec<GameRecord>> {
            self.calls.set(self.calls.get() + 1);
            Some(self.games.clone())
        }
    }

    /// Defense source that resolves nothing
    struct NoTeams;

    impl DefenseSource for NoTeams {
        fn resolve_team(&self, _team: &str) -> Option<TeamIdentity> {
            None
        }

        fn defense_profile(&self, _team: &str) -> Option<OpponentDefenseProfile> {
            None
        }
    }

    #[test]
    fn test_analyze_full_pipeline() {
        let analysis = analyzer()
            .analyze_detailed(&request("BOS"), &mut StdRng::seed_from_u64(7))
            .unwrap();

        let rec = &analysis.recommendation;
        assert!(!rec.opponent_fallback);
        assert_eq!(analysis.features.opp_abbreviation, "BOS");
        assert_eq!(analysis.features.games_played, 12);
        assert_eq!(rec.over_probability + rec.under_probability, 1.0);
        assert!(rec.kelly_over >= 0.0 && rec.kelly_under >= 0.0);
        assert!((rec.predicted_value - analysis.breakdown.predicted).abs() < 1e-12);
        assert_eq!(analysis.recent_games.len(), 5);
        assert_eq!(analysis.recent_games[0].points, 30);
    }

    #[test]
    fn test_unresolvable_opponent_uses_fallback() {
        let analysis = analyzer()
            .analyze_detailed(&request("Seattle SuperSonics"), &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert!(analysis.recommendation.opponent_fallback);
        assert!(analysis.features.opp_is_fallback);
        assert_eq!(analysis.features.opp_def_rating, 112.0);
        assert_eq!(analysis.features.opp_pace, 99.0);
    }

    #[test]
    fn test_resolved_team_without_numbers_uses_fallback() {
        let rec = analyzer().analyze_seeded(&request("Heat"), 3).unwrap();
        assert!(rec.opponent_fallback);
    }

    #[test]
    fn test_unknown_player() {
        let mut req = request("BOS");
        req.player = "Nobody Atall".to_string();
        let err = analyzer().analyze_seeded(&req, 1).unwrap_err();
        assert_eq!(err, AnalysisError::PlayerNotFound("Nobody Atall".to_string()));
    }

    #[test]
    fn test_caller_errors_fail_before_data_access() {
        let source = CountingSource {
            games: games_with_points(&POINTS),
            calls: Cell::new(0),
        };
        let analyzer = PropAnalyzer::new(ModelConfig::default(), source, NoTeams);

        let mut req = request("BOS");
        req.stat_type = "steals".to_string();
        assert!(matches!(
            analyzer.analyze_seeded(&req, 1),
            Err(AnalysisError::UnsupportedStatType(_))
        ));

        let mut req = request("BOS");
        req.odds_under = 0;
        assert_eq!(
            analyzer.analyze_seeded(&req, 1),
            Err(AnalysisError::InvalidOdds(0))
        );

        let mut req = request("BOS");
        req.prop_line = f64::NAN;
        assert!(matches!(
            analyzer.analyze_seeded(&req, 1),
            Err(AnalysisError::InvalidPropLine(_))
        ));

        assert_eq!(analyzer.games().calls.get(), 0);

        assert!(analyzer.analyze_seeded(&request("BOS"), 1).is_ok());
        assert_eq!(analyzer.games().calls.get(), 1);
    }

    #[test]
    fn test_empty_season_is_insufficient() {
        let source = CountingSource {
            games: Vec::new(),
            calls: Cell::new(0),
        };
        let analyzer = PropAnalyzer::new(ModelConfig::default(), source, NoTeams);
        let err = analyzer.analyze_seeded(&request("BOS"), 1).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));
    }

    #[test]
    fn test_seeded_analysis_is_reproducible() {
        let analyzer = analyzer();
        let a = analyzer.analyze_seeded(&request("BOS"), 99).unwrap();
        let b = analyzer.analyze_seeded(&request("BOS"), 99).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_strong_over_recommends_over() {
        let mut req = request("BOS");
        req.prop_line = 15.5;
        let rec = analyzer().analyze_seeded(&req, 5).unwrap();
        assert_eq!(rec.bet, BetSide::Over);
        assert!(rec.confidence > 0.0 && rec.confidence <= 5.0);
        assert!(rec.kelly_size > 0.0);
    }

    #[test]
    fn test_analyze_batch() {
        let analyzer = analyzer();
        let mut bad = request("BOS");
        bad.stat_type = "blocks".to_string();
        let requests = vec![request("BOS"), bad, request("MIA"), request("BOS")];

        let done = std::sync::atomic::AtomicUsize::new(0);
        let first = analyzer.analyze_batch_with(&requests, 2024, |_| {
            done.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        });
        assert_eq!(done.into_inner(), 4);
        let second = analyzer.analyze_batch(&requests, 2024);

        assert_eq!(first.len(), 4);
        assert!(first[0].is_ok());
        assert!(first[1].is_err());
        assert!(first[2].as_ref().unwrap().recommendation.opponent_fallback);

        for (a, b) in first.iter().zip(second.iter()) {
            match (a, b) {
                (Ok(a), Ok(b)) => assert_eq!(a.recommendation, b.recommendation),
                (Err(a), Err(b)) => assert_eq!(a, b),
                _ => panic!("batch results differ between runs"),
            }
        }

        // Identical requests get independent seeds
        let m0 = first[0].as_ref().unwrap().simulation.expected_value;
        let m3 = first[3].as_ref().unwrap().simulation.expected_value;
        assert_ne!(m0, m3);
    }
}
