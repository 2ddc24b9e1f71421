//! Error types for the maintenance engine
//!
//! Pre-flight rejections (unknown, disabled, already running) surface to the
//! caller directly and never produce a task result. Dependency and execution
//! failures are recorded in the history ledger instead of being re-thrown.

use std::fmt;

/// Engine error taxonomy shared by the executor, scheduler and API layer
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Task id is not present in the catalog
    TaskNotFound { task_id: String },

    /// Task exists but is disabled
    TaskDisabled { task_id: String },

    /// Task already has an execution in flight
    TaskAlreadyRunning {
        task_id: String,
        running_for_minutes: i64,
    },

    /// A declared dependency has not completed
    DependencyUnmet { task_id: String, dependency: String },

    /// The operation body failed or timed out
    ExecutionFailure { task_id: String, reason: String },

    /// A full catalog sweep is already in progress
    SweepAlreadyRunning,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::TaskNotFound { task_id } => {
                write!(f, "Task '{}' not found", task_id)
            }
            EngineError::TaskDisabled { task_id } => {
                write!(f, "Task '{}' is disabled", task_id)
            }
            EngineError::TaskAlreadyRunning {
                task_id,
                running_for_minutes,
            } => {
                write!(
                    f,
                    "Task '{}' is already running (started {}m ago)",
                    task_id, running_for_minutes
                )
            }
            EngineError::DependencyUnmet {
                task_id,
                dependency,
            } => {
                write!(
                    f,
                    "Task '{}' dependency '{}' has not completed",
                    task_id, dependency
                )
            }
            EngineError::ExecutionFailure { task_id, reason } => {
                write!(f, "Task '{}' failed: {}", task_id, reason)
            }
            EngineError::SweepAlreadyRunning => {
                write!(f, "A full task sweep is already running")
            }
        }
    }
}

impl std::error::Error for EngineError {}
