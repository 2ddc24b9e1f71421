pub mod aggregator;
pub mod probe;

pub use aggregator::{
    ComponentBreakdown, ComponentHealth, ComponentStatus, HealthAggregator, HealthTier,
    SystemHealthSnapshot,
};
pub use probe::{MetricProbe, SystemProbe};
