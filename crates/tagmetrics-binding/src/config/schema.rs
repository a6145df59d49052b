use std::time::Duration;

use serde::Deserialize;
use tagmetrics_core::error::{Error, Result};

use crate::binder::DuplicatePolicy;
use crate::tags::{DEFAULT_STATS_CPU_INTERVAL, DEFAULT_STATS_MEM_INTERVAL};

const MAX_FLUSH_INTERVAL_MS: u64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagsConfig {
    pub version: u32,

    /// Joins path segments. May be empty.
    #[serde(default = "default_separator")]
    pub separator: String,

    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,

    #[serde(default)]
    pub stats: StatsSection,
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            version: 1,
            separator: default_separator(),
            flush_interval_ms: default_flush_interval_ms(),
            duplicate_policy: DuplicatePolicy::default(),
            stats: StatsSection::default(),
        }
    }
}

impl TagsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(Error::Config(format!("unsupported config version {}", self.version)));
        }
        if !(1..=MAX_FLUSH_INTERVAL_MS).contains(&self.flush_interval_ms) {
            return Err(Error::Config(format!(
                "flush_interval_ms must be between 1 and {MAX_FLUSH_INTERVAL_MS}"
            )));
        }

        self.stats.validate()?;

        Ok(())
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatsSection {
    #[serde(default = "default_cpu_interval_ms")]
    pub cpu_interval_ms: u64,

    #[serde(default = "default_mem_interval_ms")]
    pub mem_interval_ms: u64,
}

impl Default for StatsSection {
    fn default() -> Self {
        Self {
            cpu_interval_ms: default_cpu_interval_ms(),
            mem_interval_ms: default_mem_interval_ms(),
        }
    }
}

impl StatsSection {
    pub fn validate(&self) -> Result<()> {
        if self.cpu_interval_ms == 0 {
            return Err(Error::Config("stats.cpu_interval_ms must be at least 1".into()));
        }
        if self.mem_interval_ms == 0 {
            return Err(Error::Config("stats.mem_interval_ms must be at least 1".into()));
        }
        Ok(())
    }

    pub fn cpu_interval(&self) -> Duration {
        Duration::from_millis(self.cpu_interval_ms)
    }

    pub fn mem_interval(&self) -> Duration {
        Duration::from_millis(self.mem_interval_ms)
    }
}

fn default_separator() -> String {
    ".".into()
}
fn default_flush_interval_ms() -> u64 {
    10_000
}
fn default_cpu_interval_ms() -> u64 {
    duration_ms(DEFAULT_STATS_CPU_INTERVAL)
}
fn default_mem_interval_ms() -> u64 {
    duration_ms(DEFAULT_STATS_MEM_INTERVAL)
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
pub fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
