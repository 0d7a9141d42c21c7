use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

mod config;
mod constants;
mod errors;
mod run_tracker;
mod scheduler;
mod services;
mod web;

use config::ConfigManager;
use constants::cleanup;
use run_tracker::RunTracker;
use services::{AlertService, AnalysisService, AutomationService, SyncService};
use web::{start_web_server, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with reduced verbosity
    let env_filter = EnvFilter::from_default_env()
        .add_directive("monitor=info".parse()?)
        .add_directive("tower_http=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting Influence Operations Monitor");

    // Load configuration
    let config_manager = Arc::new(ConfigManager::new("config/monitor.toml").await?);
    let config = config_manager.get_current_config().await;

    // Initialize alert service
    let alert_service = Arc::new(AlertService::new(config.alarm_webhook_url.clone()));
    if alert_service.is_enabled() {
        info!(
            "Alert service enabled with webhook: {}",
            alert_service.get_webhook_url()
        );
        match alert_service.test_webhook().await {
            Ok(()) => info!("Alert webhook test successful"),
            Err(e) => {
                error!("Alert webhook test failed: {}", e);
                warn!("Alerts may not be delivered. Check the webhook URL and network connectivity.");
            }
        }
    } else {
        warn!("No alarm webhook configured - automation outcomes will only be logged");
    }

    // Initialize run tracker and function clients
    let run_tracker = Arc::new(RunTracker::new());
    let analysis_service = Arc::new(AnalysisService::new(&config.analysis));
    let sync_service = Arc::new(SyncService::new(&config.sync));
    info!("Function clients initialized");

    // Wire automation schedules
    let automation = Arc::new(AutomationService::new(
        analysis_service,
        sync_service,
        run_tracker.clone(),
        alert_service.clone(),
    ));
    automation.apply_analysis_settings(&config.analysis.automation);
    automation.apply_sync_settings(&config.sync.automation);
    info!("Automation schedules applied");

    // Start periodic stuck-run cleanup
    let tracker_clone = run_tracker.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(
            cleanup::CLEANUP_INTERVAL_SECONDS,
        ));
        loop {
            interval.tick().await;
            let cleaned = tracker_clone.cleanup_stuck_runs(cleanup::STUCK_RUN_MINUTES);
            if cleaned > 0 {
                warn!(
                    "Cleaned up {} stuck runs older than {} minutes",
                    cleaned,
                    cleanup::STUCK_RUN_MINUTES
                );
            }
        }
    });

    // Start web server
    let state = AppState::new(
        config_manager,
        automation,
        run_tracker,
        alert_service,
    );
    start_web_server(&config.host, config.port, state).await?;

    Ok(())
}
