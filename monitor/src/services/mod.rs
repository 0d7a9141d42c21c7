pub mod alert_service;
pub mod analysis_service;
pub mod automation_service;
pub mod sync_service;

pub use alert_service::{AlertService, AlertSeverity, AlertType};
pub use analysis_service::{AnalysisOutcome, AnalysisService};
pub use automation_service::AutomationService;
pub use sync_service::{SyncOutcome, SyncService};
