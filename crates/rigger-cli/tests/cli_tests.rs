//! End-to-end tests for the `rigger` binary.

use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// `rigger` isolated from the user's config directory and environment.
fn rigger(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("rigger");
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let temp = TempDir::new().unwrap();
    rigger(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("provision"))
        .stdout(predicate::str::contains("apply"));
}

#[test]
fn version_flag() {
    let temp = TempDir::new().unwrap();
    rigger(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_flag_is_a_usage_error() {
    let temp = TempDir::new().unwrap();
    rigger(temp.path())
        .args(["provision", "--turbo"])
        .assert()
        .code(2);
}

#[test]
fn missing_application_directory_exits_three() {
    let temp = TempDir::new().unwrap();
    rigger(temp.path())
        .args(["provision", "apps/missing", "--database", "pgsql", "-y"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("apps/missing"));
}

#[test]
fn provision_without_backends_is_rejected() {
    let temp = TempDir::new().unwrap();
    rigger(temp.path())
        .args(["provision", "."])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--database"));
}

#[test]
fn unknown_driver_is_rejected() {
    let temp = TempDir::new().unwrap();
    rigger(temp.path())
        .args(["provision", ".", "--database", "cassandra", "-y"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cassandra"));
}

#[test]
fn dry_run_reports_plan_as_json_without_writing() {
    let temp = TempDir::new().unwrap();
    let output = rigger(temp.path())
        .args([
            "--output-format",
            "json",
            "provision",
            ".",
            "--database",
            "pgsql",
            "--cache",
            "redis",
            "--dry-run",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["dry_run"], true);
    assert_eq!(report["backends"]["database"]["driver"], "pgsql");
    assert_eq!(report["backends"]["cache"]["driver"], "redis");
    assert!(!temp.path().join(".env").exists());
    assert!(!temp.path().join("docker-compose.yml").exists());
}

#[test]
fn in_process_drivers_only_write_the_env_file() {
    let temp = TempDir::new().unwrap();
    rigger(temp.path())
        .args(["provision", ".", "--database", "sqlite", "--cache", "file", "-y"])
        .assert()
        .success();

    let env = fs::read_to_string(temp.path().join(".env")).unwrap();
    assert!(env.contains("DB_CONNECTION=sqlite\n"));
    assert!(env.contains("CACHE_STORE=file\n"));
    assert!(!temp.path().join("docker-compose.yml").exists());
}

#[test]
fn no_env_leaves_project_untouched() {
    let temp = TempDir::new().unwrap();
    rigger(temp.path())
        .args(["provision", ".", "--database", "sqlite", "--no-env", "-y"])
        .assert()
        .success();

    assert!(!temp.path().join(".env").exists());
}

#[test]
fn apply_runs_operations_in_order() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("shop");
    fs::create_dir(&project).unwrap();
    fs::write(project.join(".env"), "A=0\n").unwrap();
    fs::write(
        temp.path().join("ops.json"),
        r#"[
            {"action": "append", "file": ".env", "values": {"A": "1", "B": "2"}},
            {"action": "merge", "file": "composer.json", "values": {"require": {"php": "^8.3"}}}
        ]"#,
    )
    .unwrap();

    rigger(temp.path())
        .args(["apply", "ops.json", "--project", "shop"])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(project.join(".env")).unwrap(), "A=0\nB=2\n");
    let composer: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(project.join("composer.json")).unwrap()).unwrap();
    assert_eq!(composer["require"]["php"], "^8.3");
}

#[test]
fn apply_dry_run_writes_nothing() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("ops.json"),
        r#"[{"action": "set", "file": ".env", "values": {"A": "1"}}]"#,
    )
    .unwrap();

    rigger(temp.path())
        .args(["apply", "ops.json", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".env"));

    assert!(!temp.path().join(".env").exists());
}

#[test]
fn config_get_reads_local_file_and_environment() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join(".rigger.toml"),
        "[provisioning]\npoll_attempts = 7\n",
    )
    .unwrap();

    rigger(temp.path())
        .args(["config", "get", "provisioning.poll_attempts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("7"));

    rigger(temp.path())
        .env("RIGGER__ENV__FILE", ".env.local")
        .args(["config", "get", "env.file"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".env.local"));
}

#[test]
fn config_set_then_get() {
    let temp = TempDir::new().unwrap();
    rigger(temp.path()).args(["init", "--local"]).assert().success();

    rigger(temp.path())
        .args(["config", "set", "provisioning.use_containers", "false"])
        .assert()
        .success();

    rigger(temp.path())
        .args(["config", "get", "provisioning.use_containers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("false"));
}

#[test]
fn unknown_config_key_exits_four() {
    let temp = TempDir::new().unwrap();
    rigger(temp.path())
        .args(["config", "get", "nope.nothing"])
        .assert()
        .code(4);
}

#[test]
fn completions_mention_binary_name() {
    let temp = TempDir::new().unwrap();
    rigger(temp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rigger"));
}
