use thiserror::Error;

/// Failures of a single prop analysis
///
/// Every variant is fatal to the request it came from. The team-defense
/// fallback is deliberately not an error; it is reported through
/// `OpponentDefenseProfile::is_fallback` instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Player identity could not be resolved by the game log source
    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    /// Not enough games to trust the model
    #[error("Insufficient data for {context}: need at least {required} games, got {available}")]
    InsufficientData {
        context: String,
        required: usize,
        available: usize,
    },

    /// Stat selector outside the supported set
    #[error("Unsupported stat type: {0:?} (expected one of points, rebounds, assists, threes, pts+rebs, pts+asts, rebs+asts)")]
    UnsupportedStatType(String),

    /// American odds of zero
    #[error("Invalid American odds: {0}")]
    InvalidOdds(i32),

    /// Prop line that is NaN or infinite
    #[error("Invalid prop line: {0}")]
    InvalidPropLine(f64),

    /// Simulation inputs that do not describe a normal distribution
    #[error("Invalid simulation distribution: mean={mean}, std_dev={std_dev}")]
    InvalidDistribution { mean: f64, std_dev: f64 },

    /// Model probability outside [0, 1]
    #[error("Invalid probability: {0}")]
    InvalidProbability(f64),
}

impl AnalysisError {
    pub fn insufficient(context: impl Into<String>, required: usize, available: usize) -> Self {
        AnalysisError::InsufficientData {
            context: context.into(),
            required,
            available,
        }
    }
}

/// Validation functions
pub fn validate_american_odds(odds: i32) -> Result<(), AnalysisError> {
    if odds == 0 {
        return Err(AnalysisError::InvalidOdds(odds));
    }
    Ok(())
}

pub fn validate_prop_line(line: f64) -> Result<(), AnalysisError> {
    if !line.is_finite() {
        return Err(AnalysisError::InvalidPropLine(line));
    }
    Ok(())
}

pub fn validate_probability(prob: f64) -> Result<(), AnalysisError> {
    if !(0.0..=1.0).contains(&prob) {
        return Err(AnalysisError::InvalidProbability(prob));
    }
    Ok(())
}

#[cfg(feature = "api")]
pub use api::AppError;

#[cfg(feature = "api")]
mod api {
    use actix_web::{http::StatusCode, HttpResponse, ResponseError};
    use std::fmt;

    use super::AnalysisError;
    use crate::models::ErrorResponse;

    /// Application error types
    #[derive(Debug)]
    pub enum AppError {
        /// Invalid request data
        ValidationError(String),
        /// Analysis failed on the supplied inputs
        Analysis(AnalysisError),
        /// Internal server error
        InternalError(String),
    }

    impl fmt::Display for AppError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
                AppError::Analysis(err) => write!(f, "Analysis error: {}", err),
                AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            }
        }
    }

    impl std::error::Error for AppError {}

    impl From<AnalysisError> for AppError {
        fn from(err: AnalysisError) -> Self {
            AppError::Analysis(err)
        }
    }

    impl ResponseError for AppError {
        fn status_code(&self) -> StatusCode {
            match self {
                AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
                AppError::Analysis(AnalysisError::PlayerNotFound(_)) => StatusCode::NOT_FOUND,
                AppError::Analysis(AnalysisError::InsufficientData { .. }) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                AppError::Analysis(_) => StatusCode::BAD_REQUEST,
                AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }

        fn error_response(&self) -> HttpResponse {
            let error_code = match self {
                AppError::ValidationError(_) => "validation_error",
                AppError::Analysis(AnalysisError::PlayerNotFound(_)) => "player_not_found",
                AppError::Analysis(AnalysisError::InsufficientData { .. }) => "insufficient_data",
                AppError::Analysis(AnalysisError::UnsupportedStatType(_)) => "unsupported_stat_type",
                AppError::Analysis(AnalysisError::InvalidOdds(_)) => "invalid_odds",
                AppError::Analysis(_) => "invalid_input",
                AppError::InternalError(_) => "internal_error",
            };
            let message = match self {
                AppError::ValidationError(msg) | AppError::InternalError(msg) => msg.clone(),
                AppError::Analysis(err) => err.to_string(),
            };

            HttpResponse::build(self.status_code()).json(ErrorResponse {
                error: error_code.to_string(),
                message,
            })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_error_status_codes() {
            assert_eq!(
                AppError::ValidationError("".to_string()).status_code(),
                StatusCode::BAD_REQUEST
            );
            assert_eq!(
                AppError::from(AnalysisError::PlayerNotFound("x".to_string())).status_code(),
                StatusCode::NOT_FOUND
            );
            assert_eq!(
                AppError::from(AnalysisError::insufficient("season", 1, 0)).status_code(),
                StatusCode::UNPROCESSABLE_ENTITY
            );
            assert_eq!(
                AppError::from(AnalysisError::InvalidOdds(0)).status_code(),
                StatusCode::BAD_REQUEST
            );
            assert_eq!(
                AppError::InternalError("".to_string()).status_code(),
                StatusCode::INTERNAL_SERVER_ERROR
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_odds_valid() {
        assert!(validate_american_odds(-110).is_ok());
        assert!(validate_american_odds(150).is_ok());
        assert!(validate_american_odds(1).is_ok());
    }

    #[test]
    fn test_validate_odds_zero() {
        assert_eq!(validate_american_odds(0), Err(AnalysisError::InvalidOdds(0)));
    }

    #[test]
    fn test_validate_prop_line() {
        assert!(validate_prop_line(24.5).is_ok());
        assert!(validate_prop_line(0.0).is_ok());
        assert!(validate_prop_line(f64::NAN).is_err());
        assert!(validate_prop_line(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_probability() {
        assert!(validate_probability(0.0).is_ok());
        assert!(validate_probability(0.5).is_ok());
        assert!(validate_probability(1.0).is_ok());
        assert!(validate_probability(-0.1).is_err());
        assert!(validate_probability(1.1).is_err());
        assert!(validate_probability(f64::NAN).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = AnalysisError::insufficient("season window", 1, 0);
        assert!(err.to_string().contains("need at least 1 games, got 0"));

        let err = AnalysisError::UnsupportedStatType("steals".to_string());
        assert!(err.to_string().contains("\"steals\""));
    }
}
