//! End-to-end tests of the `sparse` binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn sparse(ext_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sparse").unwrap();
    cmd.env("SPARSE_PATH", ext_dir.path())
        .env_remove("SPARSE_NO_BUILTINS")
        .env_remove("RUST_LOG");
    cmd
}

fn write(dir: &TempDir, file: &str, content: &str) {
    fs::write(dir.path().join(file), content).unwrap();
}

#[test]
fn test_no_arguments_prints_help_and_exits_one() {
    let dir = TempDir::new().unwrap();

    sparse(&dir)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn test_top_level_help_flag_exits_one() {
    let dir = TempDir::new().unwrap();

    sparse(&dir)
        .arg("--help")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_list_builtin() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "greet.md",
        "---\nsubcommand:\n  about: Say hello\n  exec: [\"true\"]\n---\n",
    );

    sparse(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("greet"))
        .stdout(predicate::str::contains("Say hello"));
}

#[test]
fn test_no_builtins_env() {
    let dir = TempDir::new().unwrap();

    sparse(&dir)
        .env("SPARSE_NO_BUILTINS", "1")
        .arg("list")
        .assert()
        .code(2);
}

#[test]
fn test_unknown_subcommand_is_usage_error() {
    let dir = TempDir::new().unwrap();

    sparse(&dir)
        .arg("frobnicate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("frobnicate"));
}

#[test]
fn test_missing_extension_dir_fails_discovery() {
    let dir = TempDir::new().unwrap();

    Command::cargo_bin("sparse")
        .unwrap()
        .env("SPARSE_PATH", dir.path().join("does-not-exist"))
        .arg("list")
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("failed to discover subcommands"));
}

#[test]
fn test_duplicate_subcommand_fails_discovery() {
    let dir = TempDir::new().unwrap();
    write(&dir, "a.md", "---\nsubcommand:\n  name: go\n  exec: [\"true\"]\n---\n");
    write(&dir, "b.md", "---\nsubcommand:\n  name: go\n  exec: [\"true\"]\n---\n");

    sparse(&dir)
        .arg("go")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("go"));
}

#[cfg(unix)]
#[test]
fn test_manifest_exit_status_is_propagated() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "fail.md",
        "---\nsubcommand:\n  exec: [\"sh\", \"-c\", \"exit 3\"]\n---\n",
    );

    sparse(&dir).arg("fail").assert().code(3);
}

#[cfg(unix)]
#[test]
fn test_manifest_receives_flags_and_subcommand_name() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "greet.md",
        concat!(
            "---\n",
            "subcommand:\n",
            "  flags:\n",
            "    - name: who\n",
            "      required: true\n",
            "  exec: [\"sh\", \"-c\", \"echo $SPARSE_SUBCOMMAND $1\", \"sh\", \"{who}\"]\n",
            "---\n",
        ),
    );

    sparse(&dir)
        .args(["greet", "--who", "world"])
        .assert()
        .success()
        .stdout(predicate::str::contains("greet world"));
}

#[cfg(unix)]
#[test]
fn test_missing_program_exits_127() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "ghost.md",
        "---\nsubcommand:\n  exec: [\"sparse-test-no-such-program\"]\n---\n",
    );

    sparse(&dir).arg("ghost").assert().code(127);
}
