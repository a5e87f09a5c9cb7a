//! Trust-level sandbox escalation.
//!
//! Each [`SandboxLevel`] grants a fixed envelope of tool categories and
//! filesystem areas ([`SandboxPermissions`]). The [`SandboxEscalation`]
//! engine moves between levels one step at a time, promoting on sustained
//! success and demoting on errors or critical violations.

pub mod escalation;
pub mod thresholds;
pub mod violation;

pub use escalation::{Direction, EscalationContext, EscalationResult, SandboxEscalation};
pub use thresholds::{CriticalCounterPolicy, EscalationThresholds, ThresholdsUpdate};
pub use violation::{SecurityViolation, Severity};

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};

use crate::pattern::Pattern;

/// Trust level, ordered `Restricted < Monitored < Standard < Elevated`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SandboxLevel {
    #[default]
    Restricted,
    Monitored,
    Standard,
    Elevated,
}

impl SandboxLevel {
    pub const ALL: [SandboxLevel; 4] = [
        SandboxLevel::Restricted,
        SandboxLevel::Monitored,
        SandboxLevel::Standard,
        SandboxLevel::Elevated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SandboxLevel::Restricted => "restricted",
            SandboxLevel::Monitored => "monitored",
            SandboxLevel::Standard => "standard",
            SandboxLevel::Elevated => "elevated",
        }
    }

    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// One step up, `None` at the ceiling.
    pub fn next(self) -> Option<SandboxLevel> {
        Self::ALL.get(self.ordinal() + 1).copied()
    }

    /// One step down, `None` at the floor.
    pub fn prev(self) -> Option<SandboxLevel> {
        self.ordinal().checked_sub(1).map(|i| Self::ALL[i])
    }

    pub fn parse(s: &str) -> Option<SandboxLevel> {
        Self::ALL.into_iter().find(|l| l.as_str() == s)
    }
}

impl fmt::Display for SandboxLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse capability class, gated independently of paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    Read,
    Write,
    Execute,
    Network,
    System,
}

impl ToolCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolCategory::Read => "read",
            ToolCategory::Write => "write",
            ToolCategory::Execute => "execute",
            ToolCategory::Network => "network",
            ToolCategory::System => "system",
        }
    }
}

/// Envelope granted at one level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SandboxPermissions {
    pub allowed_tool_categories: BTreeSet<ToolCategory>,
    pub allowed_paths: Vec<Pattern>,
    pub denied_paths: Vec<Pattern>,
    pub max_concurrent_ops: u32,
    #[serde(rename = "max_execution_time_ms", serialize_with = "serialize_ms")]
    pub max_execution_time: Duration,
    pub monitored: bool,
}

fn serialize_ms<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

impl SandboxPermissions {
    /// Category must be granted; a denied path always loses, even if an
    /// allowed pattern also matches. Empty or absent paths skip path checks.
    pub fn is_allowed(&self, category: ToolCategory, path: Option<&str>) -> bool {
        if !self.allowed_tool_categories.contains(&category) {
            return false;
        }
        let Some(path) = path.filter(|p| !p.is_empty()) else {
            return true;
        };
        if self.denied_paths.iter().any(|p| p.matches(path)) {
            return false;
        }
        self.allowed_paths.is_empty() || self.allowed_paths.iter().any(|p| p.matches(path))
    }
}

const PROTECTED_PATHS: [&str; 4] = ["**/.env*", "secrets/**", "node_modules/**", ".git/**"];

/// The fixed permission table entry for `level`.
pub fn permissions_for_level(level: SandboxLevel) -> SandboxPermissions {
    use ToolCategory::*;

    let (categories, max_concurrent_ops, secs, monitored): (&[ToolCategory], u32, u64, bool) =
        match level {
            SandboxLevel::Restricted => (&[Read], 1, 30, true),
            SandboxLevel::Monitored => (&[Read, Write], 3, 60, true),
            SandboxLevel::Standard => (&[Read, Write, Execute, Network], 5, 120, false),
            SandboxLevel::Elevated => (&[Read, Write, Execute, Network, System], 10, 300, false),
        };
    let denied_paths = if level == SandboxLevel::Elevated {
        Vec::new()
    } else {
        PROTECTED_PATHS.iter().map(|p| Pattern::new(*p)).collect()
    };

    SandboxPermissions {
        allowed_tool_categories: categories.iter().copied().collect(),
        allowed_paths: vec![Pattern::new("**")],
        denied_paths,
        max_concurrent_ops,
        max_execution_time: Duration::from_secs(secs),
        monitored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_order_and_steps() {
        assert!(SandboxLevel::Restricted < SandboxLevel::Elevated);
        assert_eq!(SandboxLevel::Restricted.prev(), None);
        assert_eq!(SandboxLevel::Restricted.next(), Some(SandboxLevel::Monitored));
        assert_eq!(SandboxLevel::Standard.prev(), Some(SandboxLevel::Monitored));
        assert_eq!(SandboxLevel::Elevated.next(), None);
        assert_eq!(SandboxLevel::parse("standard"), Some(SandboxLevel::Standard));
        assert_eq!(SandboxLevel::parse("root"), None);
    }

    #[test]
    fn table_reference_values() {
        let r = permissions_for_level(SandboxLevel::Restricted);
        assert_eq!(r.allowed_tool_categories, BTreeSet::from([ToolCategory::Read]));
        assert_eq!(r.max_concurrent_ops, 1);
        assert_eq!(r.max_execution_time, Duration::from_millis(30_000));
        assert!(r.monitored);
        assert_eq!(r.denied_paths.len(), 4);

        let m = permissions_for_level(SandboxLevel::Monitored);
        assert_eq!(m.max_concurrent_ops, 3);
        assert!(m.monitored);
        assert_eq!(m.denied_paths, r.denied_paths);

        let s = permissions_for_level(SandboxLevel::Standard);
        assert_eq!(s.max_concurrent_ops, 5);
        assert!(!s.monitored);
        assert!(s.allowed_tool_categories.contains(&ToolCategory::Network));
        assert!(!s.allowed_tool_categories.contains(&ToolCategory::System));
        assert_eq!(s.denied_paths, r.denied_paths);

        let e = permissions_for_level(SandboxLevel::Elevated);
        assert_eq!(e.max_concurrent_ops, 10);
        assert_eq!(e.allowed_tool_categories.len(), 5);
        assert!(e.denied_paths.is_empty());
    }

    #[test]
    fn execution_time_increases_with_level() {
        let times: Vec<Duration> = SandboxLevel::ALL
            .into_iter()
            .map(|l| permissions_for_level(l).max_execution_time)
            .collect();
        assert!(times.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn deny_beats_allow() {
        let perms = permissions_for_level(SandboxLevel::Standard);
        assert!(perms.allowed_paths[0].matches(".git/config"));
        assert!(!perms.is_allowed(ToolCategory::Read, Some(".git/config")));
        assert!(!perms.is_allowed(ToolCategory::Read, Some("app/.env.local")));
        assert!(!perms.is_allowed(ToolCategory::Write, Some("secrets/token")));
        assert!(!perms.is_allowed(ToolCategory::Read, Some("node_modules/x/index.js")));
        assert!(perms.is_allowed(ToolCategory::Read, Some("src/main.rs")));
    }

    #[test]
    fn empty_or_missing_path_checks_category_only() {
        let perms = permissions_for_level(SandboxLevel::Restricted);
        assert!(perms.is_allowed(ToolCategory::Read, None));
        assert!(perms.is_allowed(ToolCategory::Read, Some("")));
        assert!(!perms.is_allowed(ToolCategory::Write, None));
        assert!(!perms.is_allowed(ToolCategory::Write, Some("")));
    }

    #[test]
    fn permissions_serialize_for_profile_generators() {
        let json = serde_json::to_value(permissions_for_level(SandboxLevel::Restricted)).unwrap();
        assert_eq!(json["max_execution_time_ms"], 30_000);
        assert_eq!(json["allowed_tool_categories"][0], "read");
        assert_eq!(json["denied_paths"][0], "**/.env*");
    }

    #[test]
    fn elevated_has_no_denied_paths() {
        let perms = permissions_for_level(SandboxLevel::Elevated);
        assert!(perms.is_allowed(ToolCategory::System, Some(".git/config")));
    }
}
