use actix_web::{web, HttpResponse};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

use propbet::error::AppError;
use propbet::{PropAnalysis, PropRequest};

use crate::AppState;

fn validate_request(req: &PropRequest) -> Result<(), AppError> {
    if req.player.trim().is_empty() {
        return Err(AppError::ValidationError("player must not be empty".to_string()));
    }
    if req.opponent.trim().is_empty() {
        return Err(AppError::ValidationError("opponent must not be empty".to_string()));
    }
    Ok(())
}

/// Run the analysis on the blocking pool; simulation is CPU bound
async fn run_analysis(
    state: web::Data<Arc<AppState>>,
    req: PropRequest,
) -> Result<PropAnalysis, AppError> {
    validate_request(&req)?;

    let state = state.get_ref().clone();
    let result = web::block(move || {
        let mut rng = StdRng::from_entropy();
        state.analyzer.analyze_detailed(&req, &mut rng)
    })
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok(result?)
}

/// Analyze one prop and return the recommendation
pub async fn analyze_prop(
    state: web::Data<Arc<AppState>>,
    req: web::Json<PropRequest>,
) -> Result<HttpResponse, AppError> {
    let analysis = run_analysis(state, req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(analysis.recommendation))
}

/// Analyze one prop and return every intermediate result
pub async fn analyze_prop_detailed(
    state: web::Data<Arc<AppState>>,
    req: web::Json<PropRequest>,
) -> Result<HttpResponse, AppError> {
    let analysis = run_analysis(state, req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(analysis))
}
