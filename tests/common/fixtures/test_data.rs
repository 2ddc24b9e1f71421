//! Common test data builders

use hostpanel::catalog::{TaskCategory, TaskDefinition, TaskPriority};

pub mod task_ids {
    pub const CLEANUP: &str = "cleanup-tmp-files";
    pub const BACKUP: &str = "backup-databases";
    pub const OPTIMIZE: &str = "optimize-databases";
    pub const HEALTH: &str = "system-health-check";
}

/// Enabled shell task with sensible defaults; tests mutate fields directly
pub fn shell_task(id: &str, command: &str) -> TaskDefinition {
    TaskDefinition {
        id: id.to_string(),
        name: format!("Task {}", id),
        description: String::new(),
        category: TaskCategory::Cleanup,
        priority: TaskPriority::Medium,
        enabled: true,
        schedule: None,
        estimated_minutes: 5,
        depends_on: Vec::new(),
        auto_fix: false,
        rollback_supported: false,
        command: Some(command.to_string()),
        builtin: None,
        timeout_minutes: None,
    }
}

/// Enabled task bound to a named builtin operation
pub fn builtin_task(id: &str, builtin: &str) -> TaskDefinition {
    let mut task = shell_task(id, "unused");
    task.command = None;
    task.builtin = Some(builtin.to_string());
    task
}

/// Critical-priority variant, the only priority that alerts on failure
pub fn critical_task(id: &str, builtin: &str) -> TaskDefinition {
    let mut task = builtin_task(id, builtin);
    task.priority = TaskPriority::Critical;
    task
}
