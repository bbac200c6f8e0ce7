#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn harness(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("harness").unwrap();
    cmd.current_dir(dir.path()).env("HARNESS_ROOT", dir.path());
    cmd
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn init_project(dir: &TempDir) {
    let root = dir.path();
    write(root, ".claude/harness.yaml", "memory_service:\n  enabled: false\n");
    write(
        root,
        "skills/review/SKILL.md",
        "---\nname: review\ndescription: Review the current diff\n---\nChecklist...\n",
    );
    write(root, ".claude/memory/patterns.md", "# Patterns\nErrors go through thiserror.\n");
    write(root, ".claude/rules/testing.md", "Every module has tests.\n");
    write(
        root,
        "Plans.md",
        "## 計画\n- [ ] ログイン画面 🟡\n\n## Review\n- [ ] Check parser `cc:完了`\n",
    );
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "command failed: {:?}", output);
    serde_json::from_slice(&output.stdout).unwrap()
}

// ---------------------------------------------------------------------------
// harness health
// ---------------------------------------------------------------------------

#[test]
fn health_prints_score() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    harness(&dir)
        .arg("health")
        .assert()
        .success()
        .stdout(predicate::str::contains("Health: 100/100 (good)"));
}

#[test]
fn health_json_of_empty_project() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), ".claude/harness.yaml", "memory_service:\n  enabled: false\n");

    let body = json_stdout(harness(&dir).args(["health", "--json"]));
    assert_eq!(body["score"], 70);
    assert_eq!(body["status"], "warning");
}

#[test]
fn malformed_config_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), ".claude/harness.yaml", "plans: [oops\n");
    harness(&dir)
        .arg("health")
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("error:"));
}

// ---------------------------------------------------------------------------
// harness plans
// ---------------------------------------------------------------------------

#[test]
fn plans_table_lists_tasks() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    harness(&dir)
        .arg("plans")
        .assert()
        .success()
        .stdout(predicate::str::contains("ログイン画面"))
        .stdout(predicate::str::contains("1 plan, 0 work, 0 review, 1 done"));
}

#[test]
fn plans_json_in_two_agent_mode() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let body = json_stdout(harness(&dir).args(["plans", "--mode", "2agent", "-j"]));
    assert_eq!(body["mode"], "2agent");
    assert_eq!(body["plan"][0]["priority"], "medium");
    assert_eq!(body["plan"][0]["id"], "task-1");
}

#[test]
fn plans_without_file_explains() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), ".claude/harness.yaml", "memory_service:\n  enabled: false\n");
    let body = json_stdout(harness(&dir).args(["plans", "--json"]));
    assert!(body["error"].is_string());
}

// ---------------------------------------------------------------------------
// components
// ---------------------------------------------------------------------------

#[test]
fn component_listings() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    harness(&dir)
        .arg("skills")
        .assert()
        .success()
        .stdout(predicate::str::contains("review/SKILL"))
        .stdout(predicate::str::contains("Review the current diff"));
    harness(&dir)
        .arg("notes")
        .assert()
        .success()
        .stdout(predicate::str::contains("patterns"));
    harness(&dir)
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("testing"));
    harness(&dir)
        .arg("hooks")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 hooks"));
}

// ---------------------------------------------------------------------------
// usage / insights
// ---------------------------------------------------------------------------

#[test]
fn usage_without_snapshot_says_so() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let body = json_stdout(harness(&dir).args(["usage", "--json"]));
    assert_eq!(body["available"], false);
}

#[test]
fn usage_ranks_snapshot() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    write(
        dir.path(),
        ".claude/state/harness-usage.json",
        r#"{"version":"1.0","skills":{"review":{"count":4},"plan":{"count":12}}}"#,
    );

    harness(&dir)
        .arg("usage")
        .assert()
        .success()
        .stdout(predicate::str::contains("Top skills:"))
        .stdout(predicate::str::contains("plan"));
}

#[test]
fn insights_json_has_timestamp() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let body = json_stdout(harness(&dir).args(["insights", "--json"]));
    assert!(body["generatedAt"].is_string());
    assert_eq!(body["narrative"]["available"], false);
}

#[test]
fn insights_narrative_unconfigured_is_reported() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    harness(&dir)
        .args(["insights", "--narrative"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Narrative unavailable"));
}

// ---------------------------------------------------------------------------
// harness config
// ---------------------------------------------------------------------------

#[test]
fn config_init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    harness(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));
    harness(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
    assert!(dir.path().join(".claude/harness.yaml").exists());
}

#[test]
fn config_validate_fails_on_errors() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), ".claude/harness.yaml", "usage:\n  staleness_days: -1\n");
    harness(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] usage.staleness_days"));
}

#[test]
fn config_show_json_fills_defaults() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let body = json_stdout(harness(&dir).args(["config", "show", "--json"]));
    assert_eq!(body["thresholds"]["hooks"], 10);
    assert_eq!(body["memory_service"]["enabled"], false);
}
