use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Environment variable that overrides the database location.
pub const DB_ENV_VAR: &str = "FOODLOG_DB";

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
}

impl Config {
    /// Resolve the data directory and database path. Precedence for the database:
    /// `--db`, then `FOODLOG_DB`, then `<data dir>/foodlog.db`.
    pub fn load(db_override: Option<PathBuf>) -> Result<Self> {
        let env_override = std::env::var_os(DB_ENV_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        if let Some(db_path) = db_override.or(env_override) {
            let data_dir = db_path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), PathBuf::from);
            std::fs::create_dir_all(&data_dir).with_context(|| {
                format!("Failed to create data directory: {}", data_dir.display())
            })?;
            return Ok(Config { db_path, data_dir });
        }

        let proj_dirs =
            ProjectDirs::from("", "", "foodlog").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = data_dir.join("foodlog.db");

        Ok(Config { db_path, data_dir })
    }
}
