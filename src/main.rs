use axum::{
    http::Method,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod handlers;
mod models;
mod services;
mod state;
mod storage;
mod utils;


use config::Config;
use state::AppState;
use storage::JsonFileStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("allocation_backend=debug,tower_http=debug")),
        )
        .init();

    let config = Config::from_env()?;

    let store = JsonFileStore::new(config.data_file.clone(), config.seed_file.clone());
    let state = AppState::new(Arc::new(store));

    let app = build_router(state).layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers(Any),
    );

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(
        data_file = %config.data_file.display(),
        "Allocation backend running on http://{}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    use handlers::{analytics, portfolio};

    Router::new()
        .route("/health", get(health_check))
        .route("/api/portfolio", get(portfolio::get_portfolio))
        .route("/api/portfolio/analytics", get(analytics::get_analytics))
        .route("/api/portfolio/plan", get(analytics::get_plan))
        .route("/api/subdivision-goal-seek", get(analytics::get_subdivision_goal_seek))
        .route("/api/divisions", post(portfolio::create_division))
        .route(
            "/api/divisions/:division_id",
            put(portfolio::update_division).delete(portfolio::delete_division),
        )
        .route(
            "/api/divisions/:division_id/holdings",
            post(portfolio::create_division_holding),
        )
        .route(
            "/api/divisions/:division_id/subdivisions",
            post(portfolio::create_subdivision),
        )
        .route(
            "/api/divisions/:division_id/subdivisions/:subdivision_id",
            put(portfolio::update_subdivision).delete(portfolio::delete_subdivision),
        )
        .route(
            "/api/divisions/:division_id/subdivisions/:subdivision_id/holdings",
            post(portfolio::create_subdivision_holding),
        )
        .route(
            "/api/holdings/:holding_id",
            put(portfolio::update_holding).delete(portfolio::delete_holding),
        )
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
