//! Application-wide constants for timeouts, limits, and defaults

use std::time::Duration;

/// HTTP client timeout constants
pub mod http {
    use super::Duration;

    /// Timeout for serverless function calls. Analysis batches wait on an
    /// upstream LLM, so this is generous.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

    /// Timeout for establishing HTTP connections
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Timeout for alert webhook deliveries
    pub const ALERT_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Automation defaults
pub mod automation {
    /// Batch size used when the configuration does not specify one
    pub const DEFAULT_BATCH_SIZE: u32 = 20;

    /// Default analysis automation interval in minutes
    pub const DEFAULT_ANALYSIS_INTERVAL_MINUTES: i64 = 30;

    /// Default sync automation interval in minutes
    pub const DEFAULT_SYNC_INTERVAL_MINUTES: i64 = 60;
}

/// Run tracking cleanup constants
pub mod cleanup {
    /// Interval between stuck-run cleanup passes (seconds)
    pub const CLEANUP_INTERVAL_SECONDS: u64 = 600;

    /// A run older than this is considered stuck (minutes)
    pub const STUCK_RUN_MINUTES: i64 = 120;

    /// Number of run-history entries kept in memory
    pub const RUN_HISTORY_LIMIT: usize = 200;
}
