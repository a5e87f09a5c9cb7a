//! trustgate: the authorization core for an autonomous coding agent.
//!
//! Before an agent reads or writes a file, runs a command, or touches the
//! network, it asks this crate whether the operation is allowed, denied, or
//! needs human confirmation. Two engines answer:
//!
//! - a static rule set ([`permission::PermissionManager`]) matching paths and
//!   commands against prioritized glob rules, and
//! - a trust-level state machine ([`sandbox::SandboxEscalation`]) that widens
//!   or narrows the tool categories and paths the agent may use as it
//!   succeeds, fails, or trips security violations.
//!
//! Both are pure decision engines with no I/O. [`gate::Gate`] wires them
//! together with an [`approval::ApprovalMode`] and a
//! [`limits::ResourceLimiter`] for a single session.
//!
//! # Architecture
//!
//! - **[`pattern`]**: Glob matching and specificity scoring.
//! - **[`permission`]**: Rule types, priority resolver, rule manager.
//! - **[`sandbox`]**: Trust levels, per-level envelopes, escalation engine.
//! - **[`approval`]**: suggest / auto-edit / full-auto outcome mapping.
//! - **[`limits`]**: Memory, CPU, and timeout guard.
//! - **[`gate`]**: Per-session composition of the above.
//! - **[`config`]**: Embedded defaults + user overlay merge.
//! - **[`logging`]**: Decision log and logger setup.

/// Approval modes applied to permission verdicts.
pub mod approval;
/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Configuration error taxonomy.
pub mod error;
/// Session gate combining rules, approval mode, and sandbox envelope.
pub mod gate;
/// Resource limit guard.
pub mod limits;
/// File-based decision logging.
pub mod logging;
/// Glob-like pattern matcher.
pub mod pattern;
/// Rule-based permission resolution.
pub mod permission;
/// Trust-level sandbox escalation.
pub mod sandbox;

pub use error::ConfigError;

use permission::{PermissionCheckResult, PermissionManager, PermissionRequest};

/// Check a request against the default rule set.
///
/// This is the main entry point for tests and simple usage.
/// For configured or long-lived use, build a [`PermissionManager`] or [`gate::Gate`].
pub fn check(request: &PermissionRequest) -> PermissionCheckResult {
    PermissionManager::new().check(request)
}
