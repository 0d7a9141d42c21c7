pub mod handlers;
pub mod server;

pub use server::{create_router, start_web_server};

use std::sync::Arc;

use crate::config::ConfigManager;
use crate::run_tracker::RunTracker;
use crate::services::{AlertService, AutomationService};

// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config_manager: Arc<ConfigManager>,
    pub automation: Arc<AutomationService>,
    pub run_tracker: Arc<RunTracker>,
    pub alert_service: Arc<AlertService>,
}

impl AppState {
    pub fn new(
        config_manager: Arc<ConfigManager>,
        automation: Arc<AutomationService>,
        run_tracker: Arc<RunTracker>,
        alert_service: Arc<AlertService>,
    ) -> Self {
        Self {
            config_manager,
            automation,
            run_tracker,
            alert_service,
        }
    }
}
