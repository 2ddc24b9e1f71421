//! Metric probes returning fixed readings

use anyhow::Result;
use async_trait::async_trait;
use hostpanel::health::MetricProbe;

pub struct FixedProbe {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
    pub inactive_services: Vec<String>,
}

impl FixedProbe {
    pub fn healthy() -> Self {
        Self {
            cpu: 10.0,
            memory: 30.0,
            disk: 40.0,
            inactive_services: Vec::new(),
        }
    }

    pub fn critical_disk() -> Self {
        Self {
            disk: 97.0,
            ..Self::healthy()
        }
    }

    pub fn with_inactive_service(service: &str) -> Self {
        Self {
            inactive_services: vec![service.to_string()],
            ..Self::healthy()
        }
    }
}

#[async_trait]
impl MetricProbe for FixedProbe {
    async fn cpu_usage_percent(&self) -> Result<f64> {
        Ok(self.cpu)
    }

    async fn memory_usage_percent(&self) -> Result<f64> {
        Ok(self.memory)
    }

    async fn disk_usage_percent(&self) -> Result<f64> {
        Ok(self.disk)
    }

    async fn service_is_active(&self, service: &str) -> Result<bool> {
        Ok(!self.inactive_services.iter().any(|s| s == service))
    }
}
