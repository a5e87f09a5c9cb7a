//! Approval modes layered on top of the permission verdict.
//!
//! A manager `Deny` is final in every mode. Otherwise:
//!
//! | mode | read / write | execute / all |
//! |---|---|---|
//! | `suggest` | ask | ask |
//! | `auto-edit` | allow (ask if the manager asked) | ask |
//! | `full-auto` | manager verdict | manager verdict |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::permission::{Action, PermissionCheckResult, PermissionRequest, Scope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApprovalMode {
    /// Every operation needs a human.
    #[default]
    Suggest,
    /// File reads and edits run unattended; commands need a human.
    AutoEdit,
    /// Run whatever the rules allow.
    FullAuto,
}

impl ApprovalMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalMode::Suggest => "suggest",
            ApprovalMode::AutoEdit => "auto-edit",
            ApprovalMode::FullAuto => "full-auto",
        }
    }

    pub fn parse(s: &str) -> Option<ApprovalMode> {
        [
            ApprovalMode::Suggest,
            ApprovalMode::AutoEdit,
            ApprovalMode::FullAuto,
        ]
        .into_iter()
        .find(|m| m.as_str() == s)
    }
}

impl fmt::Display for ApprovalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final outcome for `request` under `mode`, given the manager's verdict.
pub fn decide(
    mode: ApprovalMode,
    request: &PermissionRequest,
    verdict: PermissionCheckResult,
) -> PermissionCheckResult {
    if verdict.action == Action::Deny {
        return verdict;
    }

    let action = match mode {
        ApprovalMode::Suggest => Action::Ask,
        ApprovalMode::AutoEdit => match request.scope {
            Scope::Read | Scope::Write => verdict.action,
            Scope::Execute | Scope::All => Action::Ask,
        },
        ApprovalMode::FullAuto => verdict.action,
    };

    if action == verdict.action {
        return verdict;
    }
    PermissionCheckResult {
        action,
        reason: format!(
            "{} ({mode}: {} requires confirmation)",
            verdict.reason,
            request.scope.as_str()
        ),
        rule: verdict.rule,
    }
}
