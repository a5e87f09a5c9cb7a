//! Priority-ordered rule resolution.

use std::cmp::Ordering;

use crate::permission::{PermissionCheckResult, PermissionRequest, PermissionRule};

/// Evaluation order: priority desc, then `Deny > Ask > Allow`, then
/// specificity desc.
pub fn rule_order(a: &PermissionRule, b: &PermissionRule) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| b.action.cmp(&a.action))
        .then_with(|| b.pattern.specificity().cmp(&a.pattern.specificity()))
}

/// Borrowed view of `rules` in evaluation order. Stable; `rules` is untouched.
pub fn sorted(rules: &[PermissionRule]) -> Vec<&PermissionRule> {
    let mut ordered: Vec<&PermissionRule> = rules.iter().collect();
    ordered.sort_by(|a, b| rule_order(a, b));
    ordered
}

/// Return the action of the first rule, in evaluation order, that matches
/// `request`. Falls back to allow when nothing matches.
pub fn resolve(request: &PermissionRequest, rules: &[PermissionRule]) -> PermissionCheckResult {
    for rule in sorted(rules) {
        if !rule.matches(request) {
            continue;
        }
        let what = rule
            .description
            .as_deref()
            .unwrap_or(rule.action.as_str());
        log::debug!(
            "{} '{}' matched rule '{}' (priority {})",
            rule.action.label(),
            request.target(),
            rule.pattern,
            rule.priority
        );
        return PermissionCheckResult {
            action: rule.action,
            rule: Some(rule.clone()),
            reason: format!("matched rule '{}': {}", rule.pattern, what),
        };
    }

    log::debug!("ALLOW '{}': no matching rule", request.target());
    PermissionCheckResult::default_allow()
}
