//! Configuration management for the CLI
//!
//! Settings are layered: built-in defaults, then an optional JSON file
//! (`~/.config/scanwatch/config.json` unless `--config` is given), then
//! `SCANWATCH_*` environment variables. Command-line flags are applied last
//! by the caller.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use scanwatch_lib::{Lookback, ScanWindow, TrendDetector};
use serde::Deserialize;

use crate::output::{DetailLevel, OutputFormat};

/// Tunable settings for a scan run
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Window for the cluster listing call
    #[serde(default = "default_cluster_lookback")]
    pub cluster_lookback: Lookback,

    /// Window for each cluster's usage series
    #[serde(default = "default_usage_lookback")]
    pub usage_lookback: Lookback,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_cluster_limit")]
    pub cluster_limit: u32,

    #[serde(default = "default_agent_limit")]
    pub agent_limit: u32,

    /// Trailing days that must all be low to flag a cluster
    #[serde(default = "default_recent_days")]
    pub recent_days: usize,

    /// Fraction of the series maximum a recent day must stay below
    #[serde(default = "default_drop_ratio")]
    pub drop_ratio: f64,

    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default)]
    pub detail: DetailLevel,
}

fn default_cluster_lookback() -> Lookback {
    Lookback::days(30)
}

fn default_usage_lookback() -> Lookback {
    Lookback::days(30)
}

fn default_timeout_secs() -> u64 {
    3
}

fn default_cluster_limit() -> u32 {
    500
}

fn default_agent_limit() -> u32 {
    50
}

fn default_recent_days() -> usize {
    5
}

fn default_drop_ratio() -> f64 {
    0.1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cluster_lookback: default_cluster_lookback(),
            usage_lookback: default_usage_lookback(),
            timeout_secs: default_timeout_secs(),
            cluster_limit: default_cluster_limit(),
            agent_limit: default_agent_limit(),
            recent_days: default_recent_days(),
            drop_ratio: default_drop_ratio(),
            format: OutputFormat::default(),
            detail: DetailLevel::default(),
        }
    }
}

impl Settings {
    /// Load settings from the config file and environment
    ///
    /// An explicitly given file must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(
                    config::File::from(path)
                        .format(config::FileFormat::Json)
                        .required(true),
                );
            }
            None => {
                if let Some(path) = Self::config_path() {
                    builder = builder.add_source(
                        config::File::from(path)
                            .format(config::FileFormat::Json)
                            .required(false),
                    );
                }
            }
        }

        let settings: Settings = builder
            .add_source(config::Environment::with_prefix("SCANWATCH"))
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Failed to parse settings")?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the detector or client cannot work with
    pub fn validate(&self) -> Result<()> {
        ensure!(self.recent_days >= 1, "recent_days must be at least 1");
        ensure!(
            self.drop_ratio > 0.0 && self.drop_ratio <= 1.0,
            "drop_ratio must be in (0, 1], got {}",
            self.drop_ratio
        );
        ensure!(self.timeout_secs >= 1, "timeout_secs must be at least 1");
        ensure!(self.cluster_limit >= 1, "cluster_limit must be at least 1");
        ensure!(self.agent_limit >= 1, "agent_limit must be at least 1");
        Ok(())
    }

    pub fn scan_window(&self) -> ScanWindow {
        ScanWindow::new(self.cluster_lookback, self.usage_lookback)
    }

    pub fn detector(&self) -> TrendDetector {
        TrendDetector::new()
            .with_recent_window(self.recent_days)
            .with_drop_ratio(self.drop_ratio)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the default configuration file path
    fn config_path() -> Option<PathBuf> {
        let home = dirs_next::home_dir()?;
        Some(home.join(".config").join("scanwatch").join("config.json"))
    }
}
