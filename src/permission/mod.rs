//! Static, rule-based permission resolution.
//!
//! A [`PermissionRequest`] is checked against a list of [`PermissionRule`]s.
//! Rules are tried in priority order (see [`resolver::rule_order`]) and the
//! first one whose scope and pattern fit decides the [`Action`]. When nothing
//! matches the request is allowed.

pub mod manager;
pub mod resolver;
pub mod rule;

pub use manager::{PermissionManager, default_rules};
pub use resolver::resolve;
pub use rule::{Action, PermissionCheckResult, PermissionRequest, PermissionRule, Scope};
