use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;

use propbet::models::HealthResponse;
use propbet::{DefenseSource, GameLogSource};

use crate::AppState;

/// Health check endpoint
pub async fn health_check(state: web::Data<Arc<AppState>>) -> impl Responder {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        players_loaded: state.analyzer.games().player_count(),
        teams_loaded: state.analyzer.teams().team_count(),
    };

    HttpResponse::Ok().json(response)
}
