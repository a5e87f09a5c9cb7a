use crate::config::Config;
use crate::permission::{PermissionCheckResult, PermissionRequest, PermissionRule, resolver};

/// Owns a mutable rule list and answers checks against it.
///
/// Rules keep their insertion order; evaluation order is decided by the
/// resolver on every check. Patterns are compiled once when a rule is built.
#[derive(Debug, Clone, Default)]
pub struct PermissionManager {
    rules: Vec<PermissionRule>,
}

impl PermissionManager {
    /// A manager seeded with the built-in default rules (secret files denied,
    /// `rm ` and `git push` asked).
    pub fn new() -> Self {
        Self::with_rules(default_rules())
    }

    /// A manager with no rules at all: everything falls through to allow.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rules(rules: Vec<PermissionRule>) -> Self {
        Self { rules }
    }

    /// Build from configuration. The rule list in `config` already carries the
    /// defaults unless the user overlay unseeded, removed, or replaced them.
    pub fn from_config(config: &Config) -> Self {
        Self::with_rules(config.permissions.rules.clone())
    }

    /// Append a rule. Duplicates are kept.
    pub fn add_rule(&mut self, rule: PermissionRule) {
        log::info!(
            "adding permission rule: {} '{}' ({}, priority {})",
            rule.action.as_str(),
            rule.pattern,
            rule.scope.as_str(),
            rule.priority
        );
        self.rules.push(rule);
    }

    /// Remove the first rule whose pattern text equals `pattern`.
    pub fn remove_rule(&mut self, pattern: &str) -> bool {
        match self.rules.iter().position(|r| r.pattern.as_str() == pattern) {
            Some(idx) => {
                let removed = self.rules.remove(idx);
                log::info!(
                    "removed permission rule: {} '{}'",
                    removed.action.as_str(),
                    removed.pattern
                );
                true
            }
            None => false,
        }
    }

    /// Copy of the current rules in insertion order.
    pub fn rules(&self) -> Vec<PermissionRule> {
        self.rules.clone()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn check(&self, request: &PermissionRequest) -> PermissionCheckResult {
        resolver::resolve(request, &self.rules)
    }

    /// Drop every rule, defaults included.
    pub fn clear_rules(&mut self) {
        log::info!("clearing {} permission rules", self.rules.len());
        self.rules.clear();
    }
}

/// The rules every manager starts with unless told otherwise.
///
/// Note `*.env` is a suffix glob: `.env` and `config.env` are denied but
/// `.env.local` and `.env.production` are not.
pub fn default_rules() -> Vec<PermissionRule> {
    Config::default_config().permissions.rules
}
