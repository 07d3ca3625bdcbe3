use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use directories::ProjectDirs;

use macrolog_core::estimator::{FoodEstimator, UnconfiguredEstimator};

use crate::openai::OpenAiClient;

pub struct Config {
    pub db_path: PathBuf,
    pub timezone: Tz,
    pub estimator: EstimatorConfig,
}

pub struct EstimatorConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Config {
    /// Resolve paths and parse settings handed over by the command line.
    ///
    /// Without an explicit `db_path` the database lives in the per-user data
    /// directory, which is created if needed.
    pub fn load(db_path: Option<PathBuf>, timezone: &str, estimator: EstimatorConfig) -> Result<Self> {
        let db_path = match db_path {
            Some(path) => path,
            None => default_db_path()?,
        };
        let timezone = parse_timezone(timezone)?;
        Ok(Config {
            db_path,
            timezone,
            estimator,
        })
    }
}

impl EstimatorConfig {
    pub fn build(&self) -> Result<Arc<dyn FoodEstimator>> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(Arc::new(OpenAiClient::new(
                key.to_string(),
                self.model.clone(),
                &self.base_url,
                self.timeout,
            )?)),
            _ => {
                tracing::info!("OPENAI_API_KEY not set; food estimation is disabled");
                Ok(Arc::new(UnconfiguredEstimator))
            }
        }
    }
}

fn default_db_path() -> Result<PathBuf> {
    let proj_dirs =
        ProjectDirs::from("", "", "macrolog").context("Could not determine home directory")?;

    let data_dir = proj_dirs.data_dir().to_path_buf();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

    Ok(data_dir.join("macrolog.db"))
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| anyhow::anyhow!("Unknown timezone '{name}'. Use an IANA name like America/New_York"))
}
