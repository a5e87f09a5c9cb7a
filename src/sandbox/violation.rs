use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Only `Critical` counts toward automatic demotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

/// A recorded security violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityViolation {
    /// Free-form category, e.g. `"path_denied"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl SecurityViolation {
    pub fn new(
        kind: impl Into<String>,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            severity,
            description: description.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn warning(kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(kind, Severity::Warning, description)
    }

    pub fn critical(kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(kind, Severity::Critical, description)
    }

    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}
