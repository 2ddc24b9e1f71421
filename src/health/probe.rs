//! System metric probes
//!
//! `SystemProbe` reads resource usage from the local machine: memory from
//! /proc/meminfo, CPU load from two /proc/stat samples, disk usage from
//! POSIX `df` and service liveness from `systemctl is-active`. The trait
//! seam lets tests substitute fixed readings.

use crate::constants::health::CPU_SAMPLE_INTERVAL_MS;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

#[async_trait]
pub trait MetricProbe: Send + Sync {
    async fn cpu_usage_percent(&self) -> Result<f64>;
    async fn memory_usage_percent(&self) -> Result<f64>;
    async fn disk_usage_percent(&self) -> Result<f64>;
    async fn service_is_active(&self, service: &str) -> Result<bool>;
}

pub struct SystemProbe {
    disk_path: String,
}

impl SystemProbe {
    pub fn new(disk_path: String) -> Self {
        Self { disk_path }
    }
}

#[async_trait]
impl MetricProbe for SystemProbe {
    async fn cpu_usage_percent(&self) -> Result<f64> {
        let first = tokio::fs::read_to_string("/proc/stat")
            .await
            .context("Failed to read /proc/stat")?;
        let (idle_a, total_a) =
            parse_proc_stat(&first).ok_or_else(|| anyhow!("Unexpected /proc/stat format"))?;

        tokio::time::sleep(Duration::from_millis(CPU_SAMPLE_INTERVAL_MS)).await;

        let second = tokio::fs::read_to_string("/proc/stat")
            .await
            .context("Failed to read /proc/stat")?;
        let (idle_b, total_b) =
            parse_proc_stat(&second).ok_or_else(|| anyhow!("Unexpected /proc/stat format"))?;

        let total = total_b.saturating_sub(total_a);
        if total == 0 {
            return Ok(0.0);
        }
        let idle = idle_b.saturating_sub(idle_a);
        Ok(100.0 * (1.0 - idle as f64 / total as f64))
    }

    async fn memory_usage_percent(&self) -> Result<f64> {
        let meminfo = tokio::fs::read_to_string("/proc/meminfo")
            .await
            .context("Failed to read /proc/meminfo")?;
        parse_meminfo(&meminfo).ok_or_else(|| anyhow!("Unexpected /proc/meminfo format"))
    }

    async fn disk_usage_percent(&self) -> Result<f64> {
        let output = Command::new("df")
            .arg("-P")
            .arg(&self.disk_path)
            .output()
            .await
            .context("Failed to run df")?;

        if !output.status.success() {
            return Err(anyhow!(
                "df exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        parse_df_percent(&String::from_utf8_lossy(&output.stdout))
            .ok_or_else(|| anyhow!("Unexpected df output"))
    }

    async fn service_is_active(&self, service: &str) -> Result<bool> {
        let output = Command::new("systemctl")
            .arg("is-active")
            .arg(service)
            .output()
            .await
            .context("Failed to run systemctl")?;

        let state = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(state == "active")
    }
}

/// First "cpu" line of /proc/stat as (idle, total) jiffies
fn parse_proc_stat(content: &str) -> Option<(u64, u64)> {
    let line = content.lines().find(|l| l.starts_with("cpu "))?;
    let values: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|v| v.parse().ok())
        .collect();
    if values.len() < 4 {
        return None;
    }

    // idle + iowait both count as idle time
    let idle = values[3] + values.get(4).copied().unwrap_or(0);
    let total: u64 = values.iter().sum();
    Some((idle, total))
}

fn parse_meminfo(content: &str) -> Option<f64> {
    let mut total = None;
    let mut available = None;

    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            total = rest
                .split_whitespace()
                .next()
                .and_then(|v| v.parse::<f64>().ok());
        } else if let Some(rest) = line.strip_prefix("MemAvailable:") {
            available = rest
                .split_whitespace()
                .next()
                .and_then(|v| v.parse::<f64>().ok());
        }
    }

    let total = total?;
    let available = available?;
    if total <= 0.0 {
        return None;
    }
    Some(100.0 * (1.0 - available / total))
}

/// Capacity column of `df -P` output, e.g. "48%"
fn parse_df_percent(output: &str) -> Option<f64> {
    let line = output.lines().nth(1)?;
    let field = line.split_whitespace().nth(4)?;
    field.trim_end_matches('%').parse().ok()
}
