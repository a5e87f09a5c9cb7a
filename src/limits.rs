//! Numeric resource guard consulted alongside the sandbox level's caps.

use std::time::Duration;

use crate::config::LimitsConfig;
use crate::error::ConfigError;

/// Memory, CPU, and wall-clock limits. `None` means unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceLimiter {
    memory_limit: Option<u64>,
    cpu_limit: Option<f64>,
    timeout: Option<Duration>,
}

impl ResourceLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &LimitsConfig) -> Result<Self, ConfigError> {
        let mut limiter = Self::new();
        if let Some(bytes) = config.memory_bytes {
            limiter.set_memory_limit(bytes)?;
        }
        if let Some(percent) = config.cpu_percent {
            limiter.set_cpu_limit(percent)?;
        }
        if let Some(ms) = config.timeout_ms {
            limiter.set_timeout(Duration::from_millis(ms))?;
        }
        Ok(limiter)
    }

    pub fn memory_limit(&self) -> Option<u64> {
        self.memory_limit
    }

    pub fn cpu_limit(&self) -> Option<f64> {
        self.cpu_limit
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn set_memory_limit(&mut self, bytes: u64) -> Result<(), ConfigError> {
        if bytes == 0 {
            return Err(ConfigError::InvalidLimit {
                name: "memory",
                reason: "must be positive".into(),
            });
        }
        self.memory_limit = Some(bytes);
        Ok(())
    }

    /// Percentage of one core, within `[0, 100]`.
    pub fn set_cpu_limit(&mut self, percent: f64) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(ConfigError::InvalidLimit {
                name: "cpu",
                reason: format!("{percent} is outside [0, 100]"),
            });
        }
        self.cpu_limit = Some(percent);
        Ok(())
    }

    pub fn set_timeout(&mut self, timeout: Duration) -> Result<(), ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::InvalidLimit {
                name: "timeout",
                reason: "must be positive".into(),
            });
        }
        self.timeout = Some(timeout);
        Ok(())
    }

    /// At-limit usage passes.
    pub fn check_memory(&self, used_bytes: u64) -> bool {
        self.memory_limit.is_none_or(|limit| used_bytes <= limit)
    }

    /// At-limit usage passes.
    pub fn check_cpu(&self, percent: f64) -> bool {
        self.cpu_limit.is_none_or(|limit| percent <= limit)
    }
}
