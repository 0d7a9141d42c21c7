pub mod config;
pub mod constants;
pub mod errors;
pub mod run_tracker;
pub mod scheduler;
pub mod services;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigManager};
pub use run_tracker::RunTracker;
pub use scheduler::AutomationScheduler;
pub use services::{AlertService, AnalysisService, AutomationService, SyncService};
