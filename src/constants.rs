//! Application-wide constants for limits, penalties and defaults
//!
//! Organized by category so tunables live in one place instead of being
//! scattered across modules.

/// History ledger limits
pub mod history {
    /// Maximum retained results per task (oldest evicted first)
    pub const MAX_RESULTS_PER_TASK: usize = 50;
}

/// Health scoring constants
pub mod health {
    /// Points deducted per component in the warning band
    pub const WARNING_PENALTY: i32 = 15;

    /// Points deducted per critical component or inactive service
    pub const CRITICAL_PENALTY: i32 = 30;

    /// Default usage percentage where a component enters the warning band
    pub const DEFAULT_WARNING_THRESHOLD: f64 = 80.0;

    /// Default usage percentage where a component becomes critical
    pub const DEFAULT_CRITICAL_THRESHOLD: f64 = 90.0;

    /// Delay between the two /proc/stat samples used for CPU usage
    pub const CPU_SAMPLE_INTERVAL_MS: u64 = 250;
}

/// Alert system constants
pub mod alerts {
    /// Webhook request timeout
    pub const WEBHOOK_TIMEOUT_SECONDS: u64 = 10;

    /// Default minutes before a repeat alert for the same key is sent again
    pub const DEFAULT_COOLDOWN_MINUTES: i64 = 30;
}

/// Active-run tracking constants
pub mod runs {
    /// A run is reported overdue past this multiple of its estimated duration
    pub const OVERDUE_MULTIPLIER: u32 = 3;

    /// Interval for the background overdue-run check
    pub const OVERDUE_CHECK_INTERVAL_SECONDS: u64 = 300;
}

/// Default configuration values
pub mod defaults {
    /// Default listen host
    pub const HOST: &str = "0.0.0.0";

    /// Default listen port
    pub const PORT: u16 = 8090;

    /// Default schedule timezone
    pub const TIMEZONE: &str = "UTC";

    /// Default mount point probed for disk usage
    pub const DISK_PATH: &str = "/";
}
