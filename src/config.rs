use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::approval::ApprovalMode;
use crate::error::ConfigError;
use crate::permission::PermissionRule;
use crate::sandbox::{CriticalCounterPolicy, EscalationThresholds, ThresholdsUpdate};

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// Env var naming an alternative user config file.
pub const CONFIG_ENV_VAR: &str = "TRUSTGATE_CONFIG";

// ── Final (merged) config types ──

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub escalation: EscalationConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub permissions: PermissionsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub approval_mode: ApprovalMode,
    /// Append every gated decision to the decision log.
    pub log_decisions: bool,
    /// Keep the built-in rules in the rule list handed to the manager.
    pub seed_default_rules: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            approval_mode: ApprovalMode::default(),
            log_decisions: true,
            seed_default_rules: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EscalationConfig {
    #[serde(flatten)]
    pub thresholds: EscalationThresholds,
    #[serde(default)]
    pub critical_counter: CriticalCounterPolicy,
}

/// Resource limits; `None` means unconstrained.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LimitsConfig {
    pub memory_bytes: Option<u64>,
    pub cpu_percent: Option<f64>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PermissionsConfig {
    #[serde(default)]
    pub rules: Vec<PermissionRule>,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    escalation: EscalationOverlay,
    #[serde(default)]
    limits: LimitsOverlay,
    #[serde(default)]
    permissions: PermissionsOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    approval_mode: Option<ApprovalMode>,
    log_decisions: Option<bool>,
    seed_default_rules: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct EscalationOverlay {
    #[serde(flatten)]
    thresholds: ThresholdsUpdate,
    critical_counter: Option<CriticalCounterPolicy>,
}

#[derive(Debug, Deserialize, Default)]
struct LimitsOverlay {
    memory_bytes: Option<u64>,
    cpu_percent: Option<f64>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct PermissionsOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    rules: Vec<PermissionRule>,
    /// Patterns whose rules are dropped from the defaults.
    #[serde(default)]
    remove_rules: Vec<String>,
}

// ── Merge logic ──

/// Merge user rules into the default list.
/// In replace mode: user list replaces default entirely.
/// In merge mode: drop rules by pattern first, then append additions (deduped).
fn merge_rules(
    base: &mut Vec<PermissionRule>,
    add: Vec<PermissionRule>,
    remove: &[String],
    replace: bool,
) {
    if replace {
        *base = add;
    } else {
        base.retain(|rule| !remove.iter().any(|p| p == rule.pattern.as_str()));
        for rule in add {
            if !base.contains(&rule) {
                base.push(rule);
            }
        }
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge the user overlay (if it exists)
    ///
    /// A broken overlay is logged and ignored; the defaults still apply.
    pub fn load() -> Self {
        let mut config = Self::default_config();
        let Some(path) = Self::overlay_path() else {
            return config;
        };
        if !path.exists() {
            return config;
        }
        match Self::read_overlay(&path) {
            Ok(overlay) => config.apply_overlay(overlay),
            Err(e) => log::warn!("ignoring {}: {e}", path.display()),
        }
        config
    }

    /// Defaults merged with the overlay at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default_config();
        config.apply_overlay(Self::read_overlay(path)?);
        Ok(config)
    }

    /// Defaults merged with an overlay given as TOML text.
    pub fn from_overlay_str(toml_str: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default_config();
        config.apply_overlay(toml::from_str(toml_str)?);
        Ok(config)
    }

    /// `$TRUSTGATE_CONFIG` (tilde-expanded) or `~/.config/trustgate/config.toml`.
    pub fn overlay_path() -> Option<PathBuf> {
        if let Ok(custom) = std::env::var(CONFIG_ENV_VAR)
            && !custom.is_empty()
        {
            return Some(PathBuf::from(shellexpand::tilde(&custom).into_owned()));
        }
        let home = std::env::var_os("HOME")?;
        Some(Path::new(&home).join(".config/trustgate/config.toml"))
    }

    /// Validated escalation thresholds.
    pub fn thresholds(&self) -> Result<EscalationThresholds, ConfigError> {
        self.escalation.thresholds.validate()?;
        Ok(self.escalation.thresholds)
    }

    fn read_overlay(path: &Path) -> Result<ConfigOverlay, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        // Settings: scalar overrides
        let s = overlay.settings;
        if let Some(v) = s.approval_mode {
            self.settings.approval_mode = v;
        }
        if let Some(v) = s.log_decisions {
            self.settings.log_decisions = v;
        }
        if let Some(v) = s.seed_default_rules {
            self.settings.seed_default_rules = v;
        }

        // Escalation: partial threshold merge, validated when consumed
        let e = overlay.escalation;
        self.escalation.thresholds = self.escalation.thresholds.merged(&e.thresholds);
        if let Some(v) = e.critical_counter {
            self.escalation.critical_counter = v;
        }

        // Limits
        let l = overlay.limits;
        if l.memory_bytes.is_some() {
            self.limits.memory_bytes = l.memory_bytes;
        }
        if l.cpu_percent.is_some() {
            self.limits.cpu_percent = l.cpu_percent;
        }
        if l.timeout_ms.is_some() {
            self.limits.timeout_ms = l.timeout_ms;
        }

        // Permission rules. Unseeding happens before the merge so user rules
        // that happen to equal a default survive.
        if s.seed_default_rules == Some(false) {
            self.permissions.rules.clear();
        }
        let p = overlay.permissions;
        merge_rules(
            &mut self.permissions.rules,
            p.rules,
            &p.remove_rules,
            p.replace,
        );
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}
