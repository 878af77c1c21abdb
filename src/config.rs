use std::time::Duration;

use clap::{Args, ValueEnum};
use thiserror::Error;

use crate::scheduler::SchedulerConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("refresh interval must be greater than zero")]
    ZeroRefreshInterval,

    #[error("manual delay ({delay_ms} ms) must not exceed the refresh interval ({interval_ms} ms)")]
    ManualDelayTooLong { delay_ms: u64, interval_ms: u64 },

    #[error("max connections must be at least 1")]
    ZeroMaxConnections,

    #[error("invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Options shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct RuntimeArgs {
    /// Milliseconds between automatic refresh passes
    #[arg(long, env = "HR_DASHBOARD_REFRESH_INTERVAL_MS", default_value_t = 300_000, global = true)]
    pub refresh_interval_ms: u64,

    /// Delay before a manually requested pass starts
    #[arg(long, env = "HR_DASHBOARD_MANUAL_DELAY_MS", default_value_t = 300, global = true)]
    pub manual_delay_ms: u64,

    #[arg(long, env = "HR_DASHBOARD_MAX_CONNECTIONS", default_value_t = 5, global = true)]
    pub max_connections: u32,

    #[arg(long, env = "HR_DASHBOARD_LOG", default_value = "info", global = true)]
    pub log_level: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub refresh_interval: Duration,
    pub manual_delay: Duration,
    pub max_connections: u32,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl DashboardConfig {
    pub fn from_args(args: &RuntimeArgs) -> Result<Self, ConfigError> {
        let config = Self {
            refresh_interval: Duration::from_millis(args.refresh_interval_ms),
            manual_delay: Duration::from_millis(args.manual_delay_ms),
            max_connections: args.max_connections,
            log_level: args.log_level.trim().to_ascii_lowercase(),
            log_format: args.log_format,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval.is_zero() {
            return Err(ConfigError::ZeroRefreshInterval);
        }
        if self.manual_delay > self.refresh_interval {
            return Err(ConfigError::ManualDelayTooLong {
                delay_ms: self.manual_delay.as_millis() as u64,
                interval_ms: self.refresh_interval.as_millis() as u64,
            });
        }
        if self.max_connections == 0 {
            return Err(ConfigError::ZeroMaxConnections);
        }
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log_level.clone()));
        }
        Ok(())
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            refresh_interval: self.refresh_interval,
            manual_delay: self.manual_delay,
        }
    }
}
