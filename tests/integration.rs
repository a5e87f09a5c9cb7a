use trustgate::approval::ApprovalMode;
use trustgate::config::Config;
use trustgate::gate::Gate;
use trustgate::pattern;
use trustgate::permission::{Action, PermissionManager, PermissionRequest, PermissionRule, Scope};
use trustgate::sandbox::{
    Direction, EscalationContext, SandboxEscalation, SandboxLevel, SecurityViolation,
    ThresholdsUpdate, ToolCategory,
};

fn path_action(path: &str, scope: Scope) -> Action {
    trustgate::check(&PermissionRequest::path(path, scope)).action
}

fn command_action(command: &str) -> Action {
    trustgate::check(&PermissionRequest::command(command)).action
}

macro_rules! path_test {
    ($name:ident, $path:expr, $scope:ident, $action:ident) => {
        #[test]
        fn $name() {
            assert_eq!(
                path_action($path, Scope::$scope),
                Action::$action,
                "path: {}",
                $path,
            );
        }
    };
}

macro_rules! command_test {
    ($name:ident, $cmd:expr, $action:ident) => {
        #[test]
        fn $name() {
            assert_eq!(command_action($cmd), Action::$action, "command: {}", $cmd,);
        }
    };
}

// ── DENY: secret files under the default rules ──

path_test!(deny_dotenv_read, ".env", Read, Deny);
path_test!(deny_dotenv_write, ".env", Write, Deny);
path_test!(deny_config_env, "config.env", Read, Deny);
path_test!(deny_key, "id_rsa.key", Read, Deny);
path_test!(deny_pem, "server.pem", Execute, Deny);
path_test!(deny_pem_all_scope, "server.pem", All, Deny);

// ── ALLOW: documented suffix-glob gap and ordinary files ──

path_test!(allow_dotenv_local, ".env.local", Read, Allow);
path_test!(allow_dotenv_production, ".env.production", Read, Allow);
path_test!(allow_nested_env, "deploy/prod.env", Read, Allow);
path_test!(allow_source, "src/main.rs", Write, Allow);
path_test!(allow_readme, "README.md", Read, Allow);

// ── ASK: destructive or outward commands ──

command_test!(ask_git_push, "git push origin main", Ask);
command_test!(ask_git_push_force, "git push --force", Ask);
command_test!(ask_rm, "rm -rf /tmp/build", Ask);
command_test!(allow_git_status, "git status", Allow);
command_test!(allow_rmdir, "rmdir empty", Allow);
command_test!(allow_ls, "ls -la", Allow);

#[test]
fn default_env_rule_reports_reason() {
    let result = trustgate::check(&PermissionRequest::path(".env", Scope::Read));
    assert_eq!(result.action, Action::Deny);
    assert_eq!(result.rule.unwrap().pattern.as_str(), "*.env");
    assert!(result.reason.contains("*.env"), "{}", result.reason);
}

#[test]
fn command_rules_do_not_apply_to_reads() {
    let request = PermissionRequest {
        path: None,
        command: Some("git push origin main".into()),
        scope: Scope::Read,
        agent: None,
    };
    assert_eq!(trustgate::check(&request).action, Action::Allow);
}

#[test]
fn agent_never_changes_outcome() {
    let plain = trustgate::check(&PermissionRequest::path(".env", Scope::Read));
    let tagged = trustgate::check(&PermissionRequest::path(".env", Scope::Read).with_agent("x"));
    assert_eq!(plain.action, tagged.action);
    assert_eq!(plain.reason, tagged.reason);
}

// ── Rule ordering ──

#[test]
fn priority_beats_insertion_order() {
    let rules = [
        PermissionRule::allow("*.log", Scope::All).with_priority(1),
        PermissionRule::deny("*.log", Scope::All).with_priority(2),
    ];
    for ordering in [[0, 1], [1, 0]] {
        let manager =
            PermissionManager::with_rules(ordering.iter().map(|&i| rules[i].clone()).collect());
        let result = manager.check(&PermissionRequest::path("app.log", Scope::Read));
        assert_eq!(result.action, Action::Deny);
    }
}

#[test]
fn equal_priority_deny_wins() {
    let mut manager = PermissionManager::empty();
    manager.add_rule(PermissionRule::allow("*.lock", Scope::Write));
    manager.add_rule(PermissionRule::deny("*.lock", Scope::Write));
    let result = manager.check(&PermissionRequest::path("Cargo.lock", Scope::Write));
    assert_eq!(result.action, Action::Deny);
}

#[test]
fn user_allow_cannot_shadow_default_deny() {
    let mut manager = PermissionManager::new();
    manager.add_rule(PermissionRule::allow("**", Scope::All));
    assert_eq!(
        manager.check(&PermissionRequest::path("server.pem", Scope::Read)).action,
        Action::Deny
    );
}

#[test]
fn get_rules_mutation_is_isolated() {
    let mut manager = PermissionManager::new();
    let before = manager.check(&PermissionRequest::command("rm -rf target"));

    let mut copy = manager.rules();
    copy.retain(|r| r.action != Action::Ask);

    let after = manager.check(&PermissionRequest::command("rm -rf target"));
    assert_eq!(before, after);

    assert!(manager.remove_rule("rm "));
    assert_eq!(
        manager.check(&PermissionRequest::command("rm -rf target")).action,
        Action::Allow
    );
}

#[test]
fn literal_patterns_match_themselves() {
    for v in ["Cargo.toml", "src/lib.rs", "git status", "/usr/bin/env"] {
        assert!(pattern::matches(v, v), "{v}");
    }
}

// ── Sandbox escalation scenarios ──

fn ctx(confidence: f64, ok: u32, failed: u32, level: SandboxLevel) -> EscalationContext {
    EscalationContext {
        confidence_score: confidence,
        successful_tasks: ok,
        failed_tasks: failed,
        current_level: level,
    }
}

#[test]
fn max_score_promotes_only_one_level() {
    let mut engine = SandboxEscalation::new();
    let result = engine.evaluate(&ctx(100.0, 100, 0, SandboxLevel::Restricted));
    assert_eq!(result.new_level, SandboxLevel::Monitored);
    assert_eq!(result.direction, Some(Direction::Promoted));
}

#[test]
fn critical_violation_demotes_elevated() {
    let mut engine = SandboxEscalation::new();
    engine.set_level(SandboxLevel::Elevated, "granted by operator");
    let result = engine.record_violation(SecurityViolation::critical(
        "path_denied",
        "attempted to read ~/.ssh/id_rsa",
    ));
    assert_eq!(result.new_level, SandboxLevel::Standard);
    assert_eq!(result.direction, Some(Direction::Demoted));
}

#[test]
fn error_rate_overrides_confidence() {
    let mut engine = SandboxEscalation::new();
    engine.set_level(SandboxLevel::Monitored, "test");
    let result = engine.evaluate(&ctx(99.0, 10, 10, SandboxLevel::Monitored));
    assert_eq!(result.direction, Some(Direction::Demoted));
    assert_eq!(result.new_level, SandboxLevel::Restricted);
}

#[test]
fn transitions_move_at_most_one_step() {
    let contexts = [
        (100.0, 100, 0),
        (0.0, 0, 100),
        (75.0, 5, 1),
        (90.0, 50, 0),
        (100.0, 1, 0),
        (50.0, 10, 9),
    ];
    for level in SandboxLevel::ALL {
        for (confidence, ok, failed) in contexts {
            let mut engine = SandboxEscalation::new();
            engine.set_level(level, "test");
            let result = engine.evaluate(&ctx(confidence, ok, failed, level));
            let step = result.new_level.ordinal().abs_diff(level.ordinal());
            assert!(step <= 1, "{level} -> {} for {confidence}/{ok}/{failed}", result.new_level);
        }
    }
}

#[test]
fn critical_limit_triggers_exactly_once() {
    for limit in 1..=4u32 {
        let mut engine = SandboxEscalation::new();
        engine.set_level(SandboxLevel::Elevated, "test");
        engine
            .set_thresholds(&ThresholdsUpdate {
                max_critical_violations: Some(limit),
                ..Default::default()
            })
            .unwrap();

        for _ in 0..limit - 1 {
            assert!(!engine.record_violation(SecurityViolation::critical("x", "y")).changed);
        }
        assert_eq!(engine.level(), SandboxLevel::Elevated);
        assert!(engine.record_violation(SecurityViolation::critical("x", "y")).changed);
        assert_eq!(engine.level(), SandboxLevel::Standard);
    }
}

#[test]
fn denied_paths_beat_allowed_paths() {
    let mut engine = SandboxEscalation::new();
    for level in [
        SandboxLevel::Restricted,
        SandboxLevel::Monitored,
        SandboxLevel::Standard,
    ] {
        engine.set_level(level, "test");
        for path in [".env", "app/.env.local", "secrets/api", "node_modules/a", ".git/HEAD"] {
            assert!(!engine.is_allowed(ToolCategory::Read, Some(path)), "{level} {path}");
        }
        assert!(engine.is_allowed(ToolCategory::Read, Some("src/lib.rs")));
    }
}

#[test]
fn escalation_climb_widens_envelope() {
    let mut engine = SandboxEscalation::new();
    assert!(!engine.is_allowed(ToolCategory::Network, None));
    for _ in 0..2 {
        let c = engine.context(100.0, 20, 0);
        engine.evaluate(&c);
    }
    assert_eq!(engine.level(), SandboxLevel::Standard);
    assert!(engine.is_allowed(ToolCategory::Network, None));
    assert!(!engine.is_allowed(ToolCategory::System, None));
}

// ── Gate ──

#[test]
fn gate_end_to_end_with_overlay() {
    let config = Config::from_overlay_str(
        r#"
        [settings]
        approval_mode = "full-auto"
        log_decisions = false

        [[permissions.rules]]
        pattern = "cargo publish"
        action = "deny"
        scope = "execute"
        priority = 95
    "#,
    )
    .unwrap();
    let mut gate = Gate::from_config(&config).unwrap();
    assert_eq!(gate.mode(), ApprovalMode::FullAuto);

    // Restricted: execute is outside the envelope.
    let build = PermissionRequest::command("cargo build");
    assert_eq!(gate.decide(&build, ToolCategory::Execute).action, Action::Deny);

    gate.escalation_mut().set_level(SandboxLevel::Standard, "test");
    assert_eq!(gate.decide(&build, ToolCategory::Execute).action, Action::Allow);

    let publish = PermissionRequest::command("cargo publish --dry-run");
    assert_eq!(gate.decide(&publish, ToolCategory::Execute).action, Action::Deny);

    let push = PermissionRequest::command("git push");
    assert_eq!(gate.decide(&push, ToolCategory::Network).action, Action::Ask);
}
