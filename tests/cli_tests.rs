//! Command-line tests
//!
//! None of these reach the network: `init` runs with `--no-spec-copy` and
//! `migrate` is only exercised up to credential resolution.

use assert_cmd::Command;
use predicates::prelude::*;
use std::time::Duration;
use tempfile::TempDir;

const ID: &str = "0a1b2c3d-4e5f-4a6b-8c7d-8e9f0a1b2c3d";

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("preservica-ocfl").unwrap();
    cmd.timeout(Duration::from_secs(30));
    cmd
}

#[test]
fn test_help_lists_commands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("locate"));
}

#[test]
fn test_locate_without_root() {
    cli()
        .args(["locate", ID])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("0a/1b/{}", ID)));

    cli()
        .args(["locate", ID, "--depth", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("0a/1b/2c/3d/{}", ID)));
}

#[test]
fn test_locate_rejects_bad_identifier() {
    cli()
        .args(["locate", "not-a-uuid"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not-a-uuid"));
}

#[test]
fn test_depth_out_of_range() {
    let temp = TempDir::new().unwrap();
    cli()
        .args(["init", "--no-spec-copy", "-d", "5", "-r"])
        .arg(temp.path().join("ocfl"))
        .assert()
        .failure();
}

#[test]
fn test_init_then_locate_uses_recorded_depth() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("ocfl");

    cli()
        .args(["init", "--no-spec-copy", "-d", "3", "-r"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created OCFL storage root"));
    assert!(root.join("0=ocfl_1.1").is_file());

    cli()
        .args(["init", "--no-spec-copy", "-d", "3", "-r"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("already initialized"));

    cli()
        .args(["locate", ID, "-r"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("0a/1b/2c/{}", ID)))
        .stdout(predicate::str::contains("missing"));
}

#[test]
fn test_init_refuses_other_depth() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("ocfl");

    cli()
        .args(["init", "--no-spec-copy", "-r"])
        .arg(&root)
        .assert()
        .success();

    cli()
        .args(["init", "--no-spec-copy", "-d", "4", "-r"])
        .arg(&root)
        .assert()
        .code(1);
}

#[test]
fn test_migrate_without_credentials() {
    let temp = TempDir::new().unwrap();

    cli()
        .current_dir(temp.path())
        .env("HOME", temp.path())
        .env_remove("PRESERVICA_USERNAME")
        .env_remove("PRESERVICA_PASSWORD")
        .env_remove("PRESERVICA_SERVER")
        .args(["migrate", "--no-progress", "-r"])
        .arg(temp.path().join("ocfl"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no credentials"));

    assert!(!temp.path().join("ocfl").exists());
}

#[test]
fn test_locate_in_missing_root() {
    let temp = TempDir::new().unwrap();
    cli()
        .args(["locate", ID, "-r"])
        .arg(temp.path().join("nowhere"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not initialized"));
}
