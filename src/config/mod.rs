//! Engine configuration
//!
//! A single `main.toml` holds the engine settings. Task definitions live
//! in `tasks.d/*.toml`, one file per task group, merged into the config
//! at load time.

pub mod manager;

pub use manager::ConfigManager;

use crate::catalog::TaskDefinition;
use crate::constants::alerts::DEFAULT_COOLDOWN_MINUTES;
use crate::constants::defaults;
use crate::constants::health::{DEFAULT_CRITICAL_THRESHOLD, DEFAULT_WARNING_THRESHOLD};
use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// IANA timezone name; every cron schedule is evaluated in this zone
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Empty string disables alerting
    #[serde(default)]
    pub alarm_webhook_url: String,
    #[serde(default = "default_cooldown")]
    pub alert_cooldown_minutes: i64,
    /// Optional SQLite file for a durable result audit trail
    #[serde(default)]
    pub history_database_path: Option<String>,
    #[serde(default = "default_warning_threshold")]
    pub warning_threshold_percent: f64,
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold_percent: f64,
    /// systemd units whose liveness feeds the health score
    #[serde(default)]
    pub monitored_services: Vec<String>,
    #[serde(default = "default_disk_path")]
    pub disk_path: String,
    #[serde(skip)]
    pub tasks: Vec<TaskDefinition>,
}

/// One `tasks.d` file, holding a group of task definitions
#[derive(Debug, Deserialize)]
pub struct TaskFile {
    #[serde(default)]
    pub tasks: Vec<TaskDefinition>,
}

impl Config {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|e| anyhow!("Invalid timezone '{}': {}", self.timezone, e))
    }

    pub fn validate(&self) -> Result<()> {
        self.tz()?;

        if self.warning_threshold_percent >= self.critical_threshold_percent {
            return Err(anyhow!(
                "warning_threshold_percent ({}) must be below critical_threshold_percent ({})",
                self.warning_threshold_percent,
                self.critical_threshold_percent
            ));
        }

        for task in &self.tasks {
            if let Some(schedule) = &task.schedule {
                crate::scheduler::cron::validate_schedule(schedule)
                    .map_err(|e| anyhow!("Task '{}': {}", task.id, e))?;
            }
        }

        Ok(())
    }
}

fn default_host() -> String {
    defaults::HOST.to_string()
}

fn default_port() -> u16 {
    defaults::PORT
}

fn default_timezone() -> String {
    defaults::TIMEZONE.to_string()
}

fn default_cooldown() -> i64 {
    DEFAULT_COOLDOWN_MINUTES
}

fn default_warning_threshold() -> f64 {
    DEFAULT_WARNING_THRESHOLD
}

fn default_critical_threshold() -> f64 {
    DEFAULT_CRITICAL_THRESHOLD
}

fn default_disk_path() -> String {
    defaults::DISK_PATH.to_string()
}
