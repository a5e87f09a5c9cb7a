use serde::{Deserialize, Serialize};

use crate::pattern::Pattern;

/// Outcome of a permission check.
///
/// Ordered by severity: `Allow < Ask < Deny`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Allow,
    Ask,
    Deny,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Allow => "allow",
            Action::Ask => "ask",
            Action::Deny => "deny",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Action::Allow => "ALLOW",
            Action::Ask => "ASK",
            Action::Deny => "DENY",
        }
    }
}

/// Kind of access a request asks for. `All` is a wildcard on either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Read,
    Write,
    Execute,
    All,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Read => "read",
            Scope::Write => "write",
            Scope::Execute => "execute",
            Scope::All => "all",
        }
    }

    /// Whether a rule of this scope applies to a request of `other` scope.
    pub fn is_compatible(self, other: Scope) -> bool {
        self == Scope::All || other == Scope::All || self == other
    }
}

/// A single rule: pattern + action under a scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionRule {
    pub pattern: Pattern,
    pub action: Action,
    pub scope: Scope,
    #[serde(default)]
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PermissionRule {
    pub fn new(pattern: impl Into<Pattern>, action: Action, scope: Scope) -> Self {
        Self {
            pattern: pattern.into(),
            action,
            scope,
            priority: 0,
            description: None,
        }
    }

    pub fn allow(pattern: impl Into<Pattern>, scope: Scope) -> Self {
        Self::new(pattern, Action::Allow, scope)
    }

    pub fn ask(pattern: impl Into<Pattern>, scope: Scope) -> Self {
        Self::new(pattern, Action::Ask, scope)
    }

    pub fn deny(pattern: impl Into<Pattern>, scope: Scope) -> Self {
        Self::new(pattern, Action::Deny, scope)
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Scope-compatible and pattern matches the request's path or command.
    pub fn matches(&self, request: &PermissionRequest) -> bool {
        if !self.scope.is_compatible(request.scope) {
            return false;
        }
        let path_hit = request
            .path
            .as_deref()
            .is_some_and(|p| self.pattern.matches(p));
        path_hit
            || request
                .command
                .as_deref()
                .is_some_and(|c| self.pattern.matches(c))
    }
}

/// An operation awaiting a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub scope: Scope,
    /// Carried for audit only; never affects matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
}

impl PermissionRequest {
    pub fn path(path: impl Into<String>, scope: Scope) -> Self {
        Self {
            path: Some(path.into()),
            command: None,
            scope,
            agent: None,
        }
    }

    pub fn command(command: impl Into<String>) -> Self {
        Self {
            path: None,
            command: Some(command.into()),
            scope: Scope::Execute,
            agent: None,
        }
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    /// Short label of what is being accessed, for logs and reasons.
    pub fn target(&self) -> &str {
        self.command
            .as_deref()
            .or(self.path.as_deref())
            .unwrap_or("")
    }
}

/// Verdict for a request. `rule` is `None` when the default-allow fallback fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionCheckResult {
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<PermissionRule>,
    pub reason: String,
}

impl PermissionCheckResult {
    pub fn default_allow() -> Self {
        Self {
            action: Action::Allow,
            rule: None,
            reason: "no matching rule; default allow".into(),
        }
    }
}
