//! Configuration loading

use super::{Config, TaskFile};
use crate::catalog::TaskDefinition;
use anyhow::{Context, Result};
use glob::glob;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug)]
pub struct ConfigManager {
    current_config: Arc<RwLock<Arc<Config>>>,
}

impl ConfigManager {
    pub async fn new(config_dir: &str) -> Result<Self> {
        let config = Self::load_config(Path::new(config_dir)).await?;
        info!(
            "Loaded configuration with {} task definitions",
            config.tasks.len()
        );

        Ok(Self {
            current_config: Arc::new(RwLock::new(Arc::new(config))),
        })
    }

    async fn load_config(config_dir: &Path) -> Result<Config> {
        let main_path = config_dir.join("main.toml");
        let content = tokio::fs::read_to_string(&main_path)
            .await
            .with_context(|| format!("Failed to read {}", main_path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", main_path.display()))?;

        config.tasks = Self::load_task_files(config_dir).await?;
        config.validate()?;
        Ok(config)
    }

    async fn load_task_files(config_dir: &Path) -> Result<Vec<TaskDefinition>> {
        let pattern = format!("{}/tasks.d/*.toml", config_dir.display());
        let mut tasks = Vec::new();

        // glob yields paths alphabetically, so seed order follows file names
        for entry in glob(&pattern).context("Invalid task file pattern")? {
            let path = entry.context("Failed to resolve task file path")?;
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let file: TaskFile = toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            tasks.extend(file.tasks);
        }

        Ok(tasks)
    }

    pub async fn get_current_config(&self) -> Arc<Config> {
        let config = self.current_config.read().await;
        config.clone()
    }
}
