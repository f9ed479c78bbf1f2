use actix_web::{middleware, web, App, HttpServer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use propbet::{GameLogIndex, ModelConfig, PropAnalyzer, TeamDirectory};

mod handlers;

use handlers::{analyze, health};

/// Application state shared across handlers
pub struct AppState {
    pub analyzer: PropAnalyzer<GameLogIndex, TeamDirectory>,
}

fn load_model_config() -> ModelConfig {
    let Ok(path) = std::env::var("MODEL_CONFIG") else {
        return ModelConfig::default();
    };
    match ModelConfig::from_json_file(&path) {
        Ok(config) => {
            info!("Loaded model config from {}", path);
            config
        }
        Err(e) => {
            warn!("Failed to load model config {}: {}. Using defaults.", path, e);
            ModelConfig::default()
        }
    }
}

fn load_game_logs(data_dir: &Path) -> GameLogIndex {
    let path = data_dir.join("game_logs.csv");
    match GameLogIndex::load(&path) {
        Ok(index) => index,
        Err(e) => {
            error!("Failed to load game logs from {:?}: {}. No players available.", path, e);
            GameLogIndex::default()
        }
    }
}

fn load_teams(data_dir: &Path, config: &ModelConfig) -> TeamDirectory {
    let path = data_dir.join("teams.csv");
    let teams = if path.exists() {
        match TeamDirectory::load(&path) {
            Ok(teams) => teams,
            Err(e) => {
                warn!("Failed to load teams from {:?}: {}. Using built-in directory.", path, e);
                TeamDirectory::nba_teams()
            }
        }
    } else {
        warn!("No team table at {:?}; every opponent will use league averages", path);
        TeamDirectory::nba_teams()
    };
    teams.with_league_averages(propbet::data::LeagueAverages::from_config(config))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging (RUST_LOG overrides the default level)
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let addr = format!("{}:{}", host, port);

    let data_dir = std::env::var("DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"));

    info!("Loading data from {:?}", data_dir);

    let config = load_model_config();
    let games = load_game_logs(&data_dir);
    let teams = load_teams(&data_dir, &config);

    let app_state = Arc::new(AppState {
        analyzer: PropAnalyzer::new(config, games, teams),
    });

    info!("Starting Propbet API server at http://{}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .route("/health", web::get().to(health::health_check))
            .route("/analyze", web::post().to(analyze::analyze_prop))
            .route("/analyze/detailed", web::post().to(analyze::analyze_prop_detailed))
    })
    .bind(&addr)?
    .run()
    .await
}
