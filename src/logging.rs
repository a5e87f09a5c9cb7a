use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use crate::permission::{PermissionCheckResult, PermissionRequest};

/// `~/.local/share/trustgate`, or `None` without a home directory.
fn data_dir() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".local/share/trustgate"))
}

fn open_append(name: &str) -> Option<File> {
    let dir = data_dir()?;
    std::fs::create_dir_all(&dir).ok()?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(name))
        .ok()
}

/// Route `log` records to ~/.local/share/trustgate/trustgate.log.
/// Best-effort: without a writable home directory logging stays off.
pub fn init(level: LevelFilter) {
    let Some(file) = open_append("trustgate.log") else {
        return;
    };
    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Off)
        .build();
    let _ = WriteLogger::init(level, config, file);
}

/// Append a decision record to ~/.local/share/trustgate/decisions.log.
/// Best-effort: failures are silently ignored (logging must never block the gate).
pub fn log_decision(request: &PermissionRequest, result: &PermissionCheckResult) {
    let Some(mut file) = open_append("decisions.log") else {
        return;
    };
    let _ = writeln!(file, "{}", format_record(request, result));
}

/// One tab-separated line: timestamp, action, agent, scope, target, reason.
fn format_record(request: &PermissionRequest, result: &PermissionCheckResult) -> String {
    // Compact single-line reason for the log (replace newlines with "; ")
    let reason_oneline = result.reason.replace('\n', "; ");
    let target: String = request.target().chars().take(200).collect();
    let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");

    format!(
        "{ts}\t{action}\t{agent}\t{scope}\t{target}\t{reason}",
        action = result.action.as_str(),
        agent = request.agent.as_deref().unwrap_or("-"),
        scope = request.scope.as_str(),
        reason = reason_oneline,
    )
}
