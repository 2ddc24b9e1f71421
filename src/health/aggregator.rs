//! Aggregated system health scoring
//!
//! Combines resource probes and service liveness into a single snapshot
//! with a 0-100 score and an overall tier. Scoring starts from 100 and
//! deducts a fixed penalty per warning or critical finding; the overall
//! tier is the worst individual component status. A failed probe leaves
//! its component unknown and costs nothing.

use crate::constants::health::{CRITICAL_PENALTY, WARNING_PENALTY};
use crate::health::probe::MetricProbe;
use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthTier {
    Healthy,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Warning,
    Critical,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_percent: Option<f64>,
    pub status: ComponentStatus,
    #[serde(default)]
    pub issues: Vec<String>,
}

impl ComponentHealth {
    fn healthy() -> Self {
        Self {
            usage_percent: None,
            status: ComponentStatus::Healthy,
            issues: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentBreakdown {
    pub disk: ComponentHealth,
    pub memory: ComponentHealth,
    pub cpu: ComponentHealth,
    pub network: ComponentHealth,
    pub services: ComponentHealth,
    pub security: ComponentHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealthSnapshot {
    pub tier: HealthTier,
    pub score: u8,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub last_checked: DateTime<Utc>,
    pub components: ComponentBreakdown,
}

pub struct HealthAggregator {
    probe: Arc<dyn MetricProbe>,
    warning_threshold: f64,
    critical_threshold: f64,
    services: Vec<String>,
}

impl HealthAggregator {
    pub fn new(
        probe: Arc<dyn MetricProbe>,
        warning_threshold: f64,
        critical_threshold: f64,
        services: Vec<String>,
    ) -> Self {
        Self {
            probe,
            warning_threshold,
            critical_threshold,
            services,
        }
    }

    /// Produce a health snapshot; never fails, unreadable metrics are
    /// reported as unknown
    pub async fn check_system(&self) -> SystemHealthSnapshot {
        let (disk_reading, memory_reading, cpu_reading) = tokio::join!(
            self.probe.disk_usage_percent(),
            self.probe.memory_usage_percent(),
            self.probe.cpu_usage_percent(),
        );

        let mut issues = Vec::new();
        let mut recommendations = Vec::new();
        let mut deductions = 0i32;

        let disk = self.assess_resource(
            "Disk",
            disk_reading,
            "Free up disk space",
            &mut issues,
            &mut recommendations,
            &mut deductions,
        );
        let memory = self.assess_resource(
            "Memory",
            memory_reading,
            "Investigate memory-hungry processes",
            &mut issues,
            &mut recommendations,
            &mut deductions,
        );
        let cpu = self.assess_resource(
            "CPU",
            cpu_reading,
            "Investigate CPU-intensive processes",
            &mut issues,
            &mut recommendations,
            &mut deductions,
        );

        let services = self
            .check_services(&mut issues, &mut recommendations, &mut deductions)
            .await;

        // No local probes for network and security; they report a healthy
        // baseline
        let components = ComponentBreakdown {
            disk,
            memory,
            cpu,
            network: ComponentHealth::healthy(),
            services,
            security: ComponentHealth::healthy(),
        };

        let tier = worst_tier(&components);
        let score = (100i32 - deductions).max(0) as u8;

        SystemHealthSnapshot {
            tier,
            score,
            issues,
            recommendations,
            last_checked: Utc::now(),
            components,
        }
    }

    fn assess_resource(
        &self,
        label: &str,
        reading: Result<f64>,
        advice: &str,
        issues: &mut Vec<String>,
        recommendations: &mut Vec<String>,
        deductions: &mut i32,
    ) -> ComponentHealth {
        match reading {
            Ok(value) if value > self.critical_threshold => {
                *deductions += CRITICAL_PENALTY;
                let issue = format!("{} usage critical: {:.1}%", label, value);
                issues.push(issue.clone());
                recommendations.push(advice.to_string());
                ComponentHealth {
                    usage_percent: Some(value),
                    status: ComponentStatus::Critical,
                    issues: vec![issue],
                }
            }
            Ok(value) if value > self.warning_threshold => {
                *deductions += WARNING_PENALTY;
                recommendations.push(advice.to_string());
                ComponentHealth {
                    usage_percent: Some(value),
                    status: ComponentStatus::Warning,
                    issues: vec![format!("{} usage high: {:.1}%", label, value)],
                }
            }
            Ok(value) => ComponentHealth {
                usage_percent: Some(value),
                status: ComponentStatus::Healthy,
                issues: Vec::new(),
            },
            Err(e) => {
                warn!("Failed to read {} usage: {}", label, e);
                ComponentHealth {
                    usage_percent: None,
                    status: ComponentStatus::Unknown,
                    issues: vec![format!("{} usage unavailable", label)],
                }
            }
        }
    }

    async fn check_services(
        &self,
        issues: &mut Vec<String>,
        recommendations: &mut Vec<String>,
        deductions: &mut i32,
    ) -> ComponentHealth {
        if self.services.is_empty() {
            return ComponentHealth::healthy();
        }

        let mut handles = Vec::new();
        for service in &self.services {
            let probe = self.probe.clone();
            let name = service.clone();
            handles.push(tokio::spawn(async move {
                let active = probe.service_is_active(&name).await;
                (name, active)
            }));
        }

        let mut component_issues = Vec::new();
        let mut any_inactive = false;
        let mut any_error = false;

        for joined in join_all(handles).await {
            match joined {
                Ok((_, Ok(true))) => {}
                Ok((name, Ok(false))) => {
                    any_inactive = true;
                    *deductions += CRITICAL_PENALTY;
                    let issue = format!("Service {} is not running", name);
                    component_issues.push(issue.clone());
                    issues.push(issue);
                    recommendations.push(format!("Restart service {}", name));
                }
                Ok((name, Err(e))) => {
                    any_error = true;
                    warn!("Failed to check service {}: {}", name, e);
                    component_issues.push(format!("Service {} state unknown", name));
                }
                Err(e) => {
                    any_error = true;
                    warn!("Service check task panicked: {}", e);
                }
            }
        }

        let status = if any_inactive {
            ComponentStatus::Critical
        } else if any_error {
            ComponentStatus::Unknown
        } else {
            ComponentStatus::Healthy
        };

        ComponentHealth {
            usage_percent: None,
            status,
            issues: component_issues,
        }
    }
}

/// Worst component status wins; unknown components do not raise the tier
fn worst_tier(components: &ComponentBreakdown) -> HealthTier {
    let statuses = [
        components.disk.status,
        components.memory.status,
        components.cpu.status,
        components.network.status,
        components.services.status,
        components.security.status,
    ];

    if statuses.contains(&ComponentStatus::Critical) {
        HealthTier::Critical
    } else if statuses.contains(&ComponentStatus::Warning) {
        HealthTier::Warning
    } else {
        HealthTier::Healthy
    }
}
