//! Reusable test utilities:
//! - Mock webhook server for alert delivery checks
//! - Test configuration builders
//! - Controllable task operations and metric probes
//! - Engine assembly helper

// Allow unused code in test fixtures - each suite uses a different subset
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod engine;
pub mod mock_webhook;
pub mod operations;
pub mod probes;
pub mod test_config;
pub mod test_data;

pub use engine::{TestEngine, TestEngineBuilder};
pub use mock_webhook::MockWebhookServer;
pub use operations::{
    CountingOperation, FailFirstOperation, GateOperation, PanicOperation, RecordingOperation,
    SleepOperation,
};
pub use probes::FixedProbe;
pub use test_config::TestConfigBuilder;
pub use test_data::*;
