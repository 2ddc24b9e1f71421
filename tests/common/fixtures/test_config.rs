//! Test configuration builder for creating config trees programmatically

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Builds a config directory with a main.toml and tasks.d files
pub struct TestConfigBuilder {
    temp_dir: TempDir,
    timezone: String,
    webhook_url: String,
    history_database_path: Option<String>,
    task_files: Vec<(String, String)>,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
            timezone: "UTC".to_string(),
            webhook_url: String::new(),
            history_database_path: None,
            task_files: Vec::new(),
        }
    }

    pub fn timezone(mut self, timezone: &str) -> Self {
        self.timezone = timezone.to_string();
        self
    }

    pub fn webhook(mut self, url: &str) -> Self {
        self.webhook_url = url.to_string();
        self
    }

    pub fn history_database(mut self, path: &str) -> Self {
        self.history_database_path = Some(path.to_string());
        self
    }

    /// Add a raw tasks.d file; `name` is the file name without extension
    pub fn task_file(mut self, name: &str, content: &str) -> Self {
        self.task_files
            .push((format!("{}.toml", name), content.to_string()));
        self
    }

    /// Convenience for a single-task file with just id, command and schedule
    pub fn simple_task(self, id: &str, schedule: Option<&str>) -> Self {
        let schedule_line = schedule
            .map(|s| format!("schedule = \"{}\"\n", s))
            .unwrap_or_default();
        let content = format!(
            r#"[[tasks]]
id = "{id}"
name = "Task {id}"
category = "cleanup"
priority = "low"
{schedule_line}command = "true"
"#
        );
        self.task_file(id, &content)
    }

    /// Write the config tree and hand back its location
    pub fn build(self) -> TestConfig {
        let config_dir = self.temp_dir.path().join("config");
        let tasks_dir = config_dir.join("tasks.d");
        fs::create_dir_all(&tasks_dir).expect("Failed to create config dirs");

        let history_line = self
            .history_database_path
            .as_deref()
            .map(|p| format!("history_database_path = \"{}\"\n", p))
            .unwrap_or_default();
        let main_toml = format!(
            r#"host = "127.0.0.1"
port = 0
timezone = "{}"
alarm_webhook_url = "{}"
{}"#,
            self.timezone, self.webhook_url, history_line
        );
        fs::write(config_dir.join("main.toml"), main_toml).expect("Failed to write main.toml");

        for (name, content) in &self.task_files {
            fs::write(tasks_dir.join(name), content).expect("Failed to write task file");
        }

        TestConfig {
            _temp_dir: self.temp_dir,
            config_dir,
        }
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Built config tree; the temp directory lives as long as this value
pub struct TestConfig {
    _temp_dir: TempDir,
    config_dir: PathBuf,
}

impl TestConfig {
    pub fn config_dir(&self) -> &str {
        self.config_dir.to_str().expect("config path is valid utf-8")
    }
}
