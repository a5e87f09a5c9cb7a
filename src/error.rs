use thiserror::Error;

/// Configuration mistakes rejected at the mutating call.
///
/// Raising one of these never changes the state of the engine or limiter
/// that rejected the update.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The three promotion thresholds are not strictly increasing.
    #[error(
        "escalation thresholds must be strictly increasing: \
         restricted_to_monitored ({restricted_to_monitored}) < \
         monitored_to_standard ({monitored_to_standard}) < \
         standard_to_elevated ({standard_to_elevated})"
    )]
    ThresholdOrder {
        restricted_to_monitored: f64,
        monitored_to_standard: f64,
        standard_to_elevated: f64,
    },

    /// A promotion threshold lies outside `[0, 100]`.
    #[error("escalation threshold {name} must be within [0, 100], got {value}")]
    ThresholdRange { name: &'static str, value: f64 },

    /// `max_error_rate` lies outside `[0, 1]`.
    #[error("max_error_rate must be within [0, 1], got {0}")]
    ErrorRateRange(f64),

    /// `max_critical_violations` of zero would demote before any violation.
    #[error("max_critical_violations must be at least 1")]
    ZeroCriticalLimit,

    /// A resource limit value was rejected.
    #[error("invalid {name} limit: {reason}")]
    InvalidLimit { name: &'static str, reason: String },

    /// Config file could not be parsed.
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file could not be read.
    #[error("config read error: {0}")]
    Io(#[from] std::io::Error),
}
