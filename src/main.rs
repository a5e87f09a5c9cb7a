//! trustgate: gate one agent operation.
//!
//! Reads a JSON request from stdin, writes a permission decision to stdout.
//!
//! ```text
//! echo '{"command":"git push origin main","scope":"execute","category":"execute"}' \
//!     | trustgate --level standard --mode full-auto
//! ```

use std::io::Read;
use std::process::ExitCode;

use clap::Parser;
use serde::Deserialize;
use simplelog::LevelFilter;

use trustgate::approval::ApprovalMode;
use trustgate::config::Config;
use trustgate::gate::Gate;
use trustgate::permission::{PermissionRequest, Scope};
use trustgate::sandbox::{SandboxLevel, ToolCategory};

#[derive(Deserialize)]
struct GateInput {
    path: Option<String>,
    command: Option<String>,
    scope: Scope,
    agent: Option<String>,
    /// Tool category for the sandbox check; inferred from scope when absent.
    category: Option<ToolCategory>,
}

#[derive(Parser, Debug)]
#[command(name = "trustgate")]
#[command(about = "Gate one agent operation read as JSON from stdin", version)]
struct Args {
    /// Sandbox level to evaluate at
    #[arg(long, value_parser = parse_level)]
    level: Option<SandboxLevel>,
    /// Approval mode overriding the configured one
    #[arg(long, value_parser = parse_mode)]
    mode: Option<ApprovalMode>,
    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn parse_level(s: &str) -> Result<SandboxLevel, String> {
    SandboxLevel::parse(s).ok_or_else(|| format!("unknown level: {s}"))
}

fn parse_mode(s: &str) -> Result<ApprovalMode, String> {
    ApprovalMode::parse(s).ok_or_else(|| format!("unknown mode: {s}"))
}

fn category_for(scope: Scope) -> ToolCategory {
    match scope {
        Scope::Read => ToolCategory::Read,
        Scope::Write => ToolCategory::Write,
        Scope::Execute | Scope::All => ToolCategory::Execute,
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    trustgate::logging::init(if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    let mut input = String::new();
    if std::io::stdin().read_to_string(&mut input).is_err() {
        eprintln!("failed to read stdin");
        return ExitCode::FAILURE;
    }

    let gate_input: GateInput = match serde_json::from_str(&input) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("JSON parse error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let config = Config::load();
    let mut gate = match Gate::from_config(&config) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("trustgate: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(level) = args.level {
        gate.escalation_mut().set_level(level, "command line");
    }
    if let Some(mode) = args.mode {
        gate.set_mode(mode);
    }

    let category = gate_input
        .category
        .unwrap_or_else(|| category_for(gate_input.scope));
    let request = PermissionRequest {
        path: gate_input.path,
        command: gate_input.command,
        scope: gate_input.scope,
        agent: gate_input.agent,
    };
    let result = gate.decide(&request, category);

    let output = serde_json::json!({
        "action": result.action.as_str(),
        "reason": result.reason,
        "level": gate.escalation().level().as_str(),
    });
    println!("{output}");
    ExitCode::SUCCESS
}
