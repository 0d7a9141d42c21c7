use crate::web::{handlers, AppState};
use anyhow::Result;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub async fn start_web_server(host: &str, port: u16, state: AppState) -> Result<()> {
    let app = create_router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Monitor API listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // === STATUS ROUTES ===
        .route("/api/status", get(handlers::get_status))
        .route("/api/runs", get(handlers::get_recent_runs))
        // === AUTOMATION SETTINGS ROUTES ===
        .route("/api/automation", get(handlers::get_automation_settings))
        .route(
            "/api/automation/analysis",
            put(handlers::update_analysis_automation),
        )
        .route(
            "/api/automation/sync",
            put(handlers::update_sync_automation),
        )
        // === MANUAL TRIGGER ROUTES ===
        .route("/api/analysis/run", post(handlers::run_analysis_now))
        .route("/api/sync/run", post(handlers::run_sync_now))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
