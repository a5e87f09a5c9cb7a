use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sandbox::SandboxLevel;

/// What happens to the critical-violation counter once it triggers a demotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CriticalCounterPolicy {
    /// Counter returns to zero; another full run of criticals is needed to
    /// demote again.
    #[default]
    ResetOnDemotion,
    /// Counter keeps growing; every further critical demotes again.
    Accumulate,
}

/// Promotion and demotion criteria.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EscalationThresholds {
    pub restricted_to_monitored: f64,
    pub monitored_to_standard: f64,
    pub standard_to_elevated: f64,
    pub min_successful_tasks: u32,
    pub max_error_rate: f64,
    pub max_critical_violations: u32,
}

impl Default for EscalationThresholds {
    fn default() -> Self {
        Self {
            restricted_to_monitored: 60.0,
            monitored_to_standard: 75.0,
            standard_to_elevated: 90.0,
            min_successful_tasks: 5,
            max_error_rate: 0.2,
            max_critical_violations: 1,
        }
    }
}

impl EscalationThresholds {
    /// Confidence needed to leave `level` upward, `None` at the ceiling.
    pub fn promotion_threshold(&self, level: SandboxLevel) -> Option<f64> {
        match level {
            SandboxLevel::Restricted => Some(self.restricted_to_monitored),
            SandboxLevel::Monitored => Some(self.monitored_to_standard),
            SandboxLevel::Standard => Some(self.standard_to_elevated),
            SandboxLevel::Elevated => None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("restricted_to_monitored", self.restricted_to_monitored),
            ("monitored_to_standard", self.monitored_to_standard),
            ("standard_to_elevated", self.standard_to_elevated),
        ];
        for (name, value) in named {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::ThresholdRange { name, value });
            }
        }
        if !(self.restricted_to_monitored < self.monitored_to_standard
            && self.monitored_to_standard < self.standard_to_elevated)
        {
            return Err(ConfigError::ThresholdOrder {
                restricted_to_monitored: self.restricted_to_monitored,
                monitored_to_standard: self.monitored_to_standard,
                standard_to_elevated: self.standard_to_elevated,
            });
        }
        if !(0.0..=1.0).contains(&self.max_error_rate) {
            return Err(ConfigError::ErrorRateRange(self.max_error_rate));
        }
        if self.max_critical_violations == 0 {
            return Err(ConfigError::ZeroCriticalLimit);
        }
        Ok(())
    }

    /// Copy of `self` with every field set in `update` replaced.
    pub fn merged(&self, update: &ThresholdsUpdate) -> Self {
        Self {
            restricted_to_monitored: update
                .restricted_to_monitored
                .unwrap_or(self.restricted_to_monitored),
            monitored_to_standard: update
                .monitored_to_standard
                .unwrap_or(self.monitored_to_standard),
            standard_to_elevated: update
                .standard_to_elevated
                .unwrap_or(self.standard_to_elevated),
            min_successful_tasks: update
                .min_successful_tasks
                .unwrap_or(self.min_successful_tasks),
            max_error_rate: update.max_error_rate.unwrap_or(self.max_error_rate),
            max_critical_violations: update
                .max_critical_violations
                .unwrap_or(self.max_critical_violations),
        }
    }
}

/// Partial threshold update; unset fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct ThresholdsUpdate {
    pub restricted_to_monitored: Option<f64>,
    pub monitored_to_standard: Option<f64>,
    pub standard_to_elevated: Option<f64>,
    pub min_successful_tasks: Option<u32>,
    pub max_error_rate: Option<f64>,
    pub max_critical_violations: Option<u32>,
}
