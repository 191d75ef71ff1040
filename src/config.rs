use crate::types::Config;
use anyhow::{bail, Context, Result};
use std::fs;
use std::time::Duration;

/// Highest tick rate that still leaves a whole millisecond per tick.
const MAX_UI_FREQ: u32 = 1000;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading config {}", path))?;
        Self::parse(&contents).with_context(|| format!("invalid config {}", path))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents)?;
        if config.ui.freq == 0 || config.ui.freq > MAX_UI_FREQ {
            bail!(
                "ui.freq must be between 1 and {} Hz, got {}",
                MAX_UI_FREQ,
                config.ui.freq
            );
        }
        Ok(config)
    }

    /// Interval between UI ticks, never shorter than 1 ms
    pub fn tick_period(&self) -> Duration {
        let millis = 1000 / self.ui.freq.max(1) as u64;
        Duration::from_millis(millis.max(1))
    }

    /// Tracing filter directive for the configured level
    pub fn log_filter(&self) -> String {
        format!("onroad_ui={}", self.logging.level)
    }
}
