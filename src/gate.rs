use std::time::Duration;

use crate::approval::{self, ApprovalMode};
use crate::config::Config;
use crate::error::ConfigError;
use crate::limits::ResourceLimiter;
use crate::logging;
use crate::permission::{Action, PermissionCheckResult, PermissionManager, PermissionRequest};
use crate::sandbox::{SandboxEscalation, ToolCategory};

/// Everything needed to gate one agent session's operations.
///
/// A request goes through the rule set, then the approval mode, then the
/// current sandbox envelope. Any stage may tighten the verdict; none may
/// loosen a deny.
#[derive(Debug, Clone)]
pub struct Gate {
    permissions: PermissionManager,
    escalation: SandboxEscalation,
    limiter: ResourceLimiter,
    mode: ApprovalMode,
    log_decisions: bool,
}

impl Gate {
    pub fn new(
        permissions: PermissionManager,
        escalation: SandboxEscalation,
        mode: ApprovalMode,
    ) -> Self {
        Self {
            permissions,
            escalation,
            limiter: ResourceLimiter::new(),
            mode,
            log_decisions: false,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            permissions: PermissionManager::from_config(config),
            escalation: SandboxEscalation::from_config(config)?,
            limiter: ResourceLimiter::from_config(&config.limits)?,
            mode: config.settings.approval_mode,
            log_decisions: config.settings.log_decisions,
        })
    }

    pub fn with_limiter(mut self, limiter: ResourceLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn permissions(&self) -> &PermissionManager {
        &self.permissions
    }

    pub fn permissions_mut(&mut self) -> &mut PermissionManager {
        &mut self.permissions
    }

    pub fn escalation(&self) -> &SandboxEscalation {
        &self.escalation
    }

    pub fn escalation_mut(&mut self) -> &mut SandboxEscalation {
        &mut self.escalation
    }

    pub fn limiter(&self) -> &ResourceLimiter {
        &self.limiter
    }

    pub fn mode(&self) -> ApprovalMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ApprovalMode) {
        self.mode = mode;
    }

    /// Final verdict for `request` dispatched as a `category` tool.
    pub fn decide(
        &self,
        request: &PermissionRequest,
        category: ToolCategory,
    ) -> PermissionCheckResult {
        let verdict = approval::decide(self.mode, request, self.permissions.check(request));
        let result = if verdict.action == Action::Deny
            || self.escalation.is_allowed(category, request.path.as_deref())
        {
            verdict
        } else {
            let level = self.escalation.level();
            PermissionCheckResult {
                action: Action::Deny,
                reason: format!(
                    "sandbox level {level} does not permit {} access{}",
                    category.as_str(),
                    request
                        .path
                        .as_deref()
                        .filter(|p| !p.is_empty())
                        .map(|p| format!(" to {p}"))
                        .unwrap_or_default()
                ),
                rule: verdict.rule,
            }
        };

        if self.log_decisions {
            logging::log_decision(request, &result);
        }
        result
    }

    /// Tighter of the limiter's timeout and the current level's cap.
    pub fn effective_timeout(&self) -> Duration {
        let cap = self.escalation.permissions().max_execution_time;
        self.limiter.timeout().map_or(cap, |t| t.min(cap))
    }

    pub fn max_concurrent_ops(&self) -> u32 {
        self.escalation.permissions().max_concurrent_ops
    }
}
