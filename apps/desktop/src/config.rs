//! Application configuration from the environment.

use crate::algorithm::FsrsScheduler;
use anyhow::Context;
use std::path::{Path, PathBuf};
use study_core::{SchedulerAdapter, SchedulerConfig};

pub const DATABASE_PATH_VAR: &str = "STUDY_DATABASE_PATH";
pub const USER_VAR: &str = "STUDY_USER";
pub const SCHEDULER_CONFIG_VAR: &str = "STUDY_SCHEDULER_CONFIG";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub username: String,
    pub scheduler: SchedulerConfig,
}

impl AppConfig {
    /// Read configuration from the environment, after loading `.env` if present.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_path = std::env::var_os(DATABASE_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let username = std::env::var(USER_VAR)
            .or_else(|_| std::env::var("USER"))
            .unwrap_or_else(|_| "local".to_string());

        let scheduler = match std::env::var_os(SCHEDULER_CONFIG_VAR) {
            Some(path) => load_scheduler_config(Path::new(&path))?,
            None => SchedulerConfig::default(),
        };

        Ok(Self {
            database_path,
            username,
            scheduler,
        })
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("study-desktop")
        .join("study.db")
}

/// Load a scheduler configuration file. Missing fields take their defaults.
///
/// The file is checked by building a scheduler from it, so a bad weight
/// vector fails here rather than on the first study session.
pub fn load_scheduler_config(path: &Path) -> anyhow::Result<SchedulerConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scheduler config {}", path.display()))?;
    let config: SchedulerConfig = serde_json::from_str(&raw)
        .with_context(|| format!("invalid scheduler config {}", path.display()))?;
    FsrsScheduler::from_config(&config)
        .with_context(|| format!("invalid scheduler config {}", path.display()))?;
    Ok(config)
}
