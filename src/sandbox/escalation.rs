use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::ConfigError;
use crate::sandbox::{
    CriticalCounterPolicy, EscalationThresholds, SandboxLevel, SandboxPermissions,
    SecurityViolation, ThresholdsUpdate, ToolCategory, permissions_for_level,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Promoted,
    Demoted,
}

/// Observed task outcomes fed to [`SandboxEscalation::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EscalationContext {
    /// 0..=100.
    pub confidence_score: f64,
    pub successful_tasks: u32,
    pub failed_tasks: u32,
    pub current_level: SandboxLevel,
}

impl EscalationContext {
    /// Failed share of all recorded tasks; 0 when none were recorded.
    pub fn error_rate(&self) -> f64 {
        let total = u64::from(self.successful_tasks) + u64::from(self.failed_tasks);
        if total == 0 {
            0.0
        } else {
            self.failed_tasks as f64 / total as f64
        }
    }
}

/// `changed` and `direction` are only set when the level actually moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationResult {
    pub changed: bool,
    pub direction: Option<Direction>,
    pub new_level: SandboxLevel,
}

impl EscalationResult {
    fn unchanged(level: SandboxLevel) -> Self {
        Self {
            changed: false,
            direction: None,
            new_level: level,
        }
    }
}

/// Trust-level state machine for one agent session.
///
/// Moves one level at a time. Demotion always takes precedence over
/// promotion. Violations accumulate until [`reset`](Self::reset).
#[derive(Debug, Clone)]
pub struct SandboxEscalation {
    level: SandboxLevel,
    thresholds: EscalationThresholds,
    counter_policy: CriticalCounterPolicy,
    table: Vec<SandboxPermissions>,
    violations: Vec<SecurityViolation>,
    critical_count: u32,
}

impl Default for SandboxEscalation {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxEscalation {
    /// Start at `Restricted` with default thresholds.
    pub fn new() -> Self {
        Self {
            level: SandboxLevel::Restricted,
            thresholds: EscalationThresholds::default(),
            counter_policy: CriticalCounterPolicy::default(),
            table: SandboxLevel::ALL
                .into_iter()
                .map(permissions_for_level)
                .collect(),
            violations: Vec::new(),
            critical_count: 0,
        }
    }

    pub fn with_thresholds(thresholds: EscalationThresholds) -> Result<Self, ConfigError> {
        thresholds.validate()?;
        Ok(Self {
            thresholds,
            ..Self::new()
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::with_thresholds(config.thresholds()?)?
            .with_counter_policy(config.escalation.critical_counter))
    }

    pub fn with_counter_policy(mut self, policy: CriticalCounterPolicy) -> Self {
        self.counter_policy = policy;
        self
    }

    pub fn level(&self) -> SandboxLevel {
        self.level
    }

    pub fn thresholds(&self) -> &EscalationThresholds {
        &self.thresholds
    }

    pub fn counter_policy(&self) -> CriticalCounterPolicy {
        self.counter_policy
    }

    /// Every violation recorded since construction or the last reset.
    pub fn violations(&self) -> &[SecurityViolation] {
        &self.violations
    }

    pub fn critical_violations(&self) -> u32 {
        self.critical_count
    }

    pub fn permissions(&self) -> &SandboxPermissions {
        self.permissions_for_level(self.level)
    }

    pub fn permissions_for_level(&self, level: SandboxLevel) -> &SandboxPermissions {
        &self.table[level.ordinal()]
    }

    /// Whether the current level grants `category` on `path`.
    pub fn is_allowed(&self, category: ToolCategory, path: Option<&str>) -> bool {
        self.permissions().is_allowed(category, path)
    }

    /// Context for `evaluate` anchored at the current level.
    pub fn context(
        &self,
        confidence_score: f64,
        successful_tasks: u32,
        failed_tasks: u32,
    ) -> EscalationContext {
        EscalationContext {
            confidence_score,
            successful_tasks,
            failed_tasks,
            current_level: self.level,
        }
    }

    /// Decide one promotion or demotion step from the engine's level.
    ///
    /// A stale `ctx.current_level` is logged and otherwise ignored, so the
    /// reported level and the granted envelope never diverge.
    pub fn evaluate(&mut self, ctx: &EscalationContext) -> EscalationResult {
        let from = self.level;
        if ctx.current_level != from {
            log::warn!(
                "context reports {} but engine is at {from}; using {from}",
                ctx.current_level
            );
        }

        let error_rate = ctx.error_rate();
        if error_rate > self.thresholds.max_error_rate {
            let reason = format!(
                "error rate {:.2} exceeds {:.2}",
                error_rate, self.thresholds.max_error_rate
            );
            return self.step(from, from.prev(), Direction::Demoted, &reason);
        }
        if self.critical_count >= self.thresholds.max_critical_violations {
            return self.demote_for_criticals();
        }

        if let Some(threshold) = self.thresholds.promotion_threshold(from)
            && ctx.confidence_score >= threshold
            && ctx.successful_tasks >= self.thresholds.min_successful_tasks
        {
            let reason = format!(
                "confidence {:.1} >= {:.1} after {} successful tasks",
                ctx.confidence_score, threshold, ctx.successful_tasks
            );
            return self.step(from, from.next(), Direction::Promoted, &reason);
        }

        EscalationResult::unchanged(from)
    }

    /// Append `violation`; enough criticals demote one level.
    pub fn record_violation(&mut self, violation: SecurityViolation) -> EscalationResult {
        log::warn!(
            "security violation at {} [{}] {}: {}",
            self.level,
            violation.severity.as_str(),
            violation.kind,
            violation.description
        );
        let critical = violation.is_critical();
        self.violations.push(violation);

        if !critical {
            return EscalationResult::unchanged(self.level);
        }

        self.critical_count = self.critical_count.saturating_add(1);
        if self.critical_count < self.thresholds.max_critical_violations {
            return EscalationResult::unchanged(self.level);
        }

        self.demote_for_criticals()
    }

    /// Merge `update` into the thresholds. On error nothing changes.
    pub fn set_thresholds(&mut self, update: &ThresholdsUpdate) -> Result<(), ConfigError> {
        let merged = self.thresholds.merged(update);
        merged.validate()?;
        log::info!("escalation thresholds updated: {merged:?}");
        self.thresholds = merged;
        Ok(())
    }

    /// Administrative override. Violation history is untouched.
    pub fn set_level(&mut self, level: SandboxLevel, reason: &str) {
        log::info!("sandbox level set {} -> {level}: {reason}", self.level);
        self.level = level;
    }

    /// Back to `Restricted` with an empty violation history.
    pub fn reset(&mut self) {
        log::info!(
            "sandbox escalation reset from {} ({} violations cleared)",
            self.level,
            self.violations.len()
        );
        self.level = SandboxLevel::Restricted;
        self.violations.clear();
        self.critical_count = 0;
    }

    fn demote_for_criticals(&mut self) -> EscalationResult {
        let reason = format!("{} critical violations", self.critical_count);
        let from = self.level;
        let result = self.step(from, from.prev(), Direction::Demoted, &reason);
        if self.counter_policy == CriticalCounterPolicy::ResetOnDemotion {
            self.critical_count = 0;
        }
        result
    }

    fn step(
        &mut self,
        from: SandboxLevel,
        to: Option<SandboxLevel>,
        direction: Direction,
        reason: &str,
    ) -> EscalationResult {
        let Some(to) = to else {
            log::debug!("{direction:?} from {from} not possible: {reason}");
            return EscalationResult::unchanged(from);
        };
        match direction {
            Direction::Promoted => log::info!("sandbox promoted {from} -> {to}: {reason}"),
            Direction::Demoted => log::warn!("sandbox demoted {from} -> {to}: {reason}"),
        }
        self.level = to;
        EscalationResult {
            changed: true,
            direction: Some(direction),
            new_level: to,
        }
    }
}
