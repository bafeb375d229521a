//! Integration tests for the KeyTree CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! Passwords come from `KEYTREE_PASSWORD` / `KEYTREE_NEW_PASSWORD` so no
//! interactive prompt is needed, and the config directory is pointed at
//! a temp dir so the user's real settings are never read.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const PASSWORD: &str = "integration-pw";

/// Helper: get a Command pointing at the keytree binary.
fn keytree() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("keytree").expect("binary should exist")
}

/// Helper: a command bound to a store file inside `tmp`.
fn keytree_in(tmp: &TempDir, password: &str) -> Command {
    let store = tmp.child("secrets.ktree");
    let mut cmd = keytree();
    cmd.env("XDG_CONFIG_HOME", tmp.child("config").path())
        .env("KEYTREE_PASSWORD", password)
        .env_remove("KEYTREE_FILE")
        .env_remove("KEYTREE_NEW_PASSWORD")
        .arg("--file")
        .arg(store.path());
    cmd
}

#[test]
fn help_flag_shows_usage() {
    keytree()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Password-encrypted hierarchical secret store",
        ))
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("set"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("tree"))
        .stdout(predicate::str::contains("rotate"))
        .stdout(predicate::str::contains("shell"));
}

#[test]
fn version_flag_shows_version() {
    keytree()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("keytree"));
}

#[test]
fn no_args_shows_help() {
    keytree()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn set_then_get_roundtrip() {
    let tmp = TempDir::new().unwrap();

    keytree_in(&tmp, PASSWORD)
        .args(["set", "email/gmail", "hunter2"])
        .assert()
        .success();

    tmp.child("secrets.ktree").assert(predicate::path::exists());

    keytree_in(&tmp, PASSWORD)
        .args(["get", "email/gmail"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hunter2"));
}

#[test]
fn store_file_holds_no_plaintext() {
    let tmp = TempDir::new().unwrap();

    keytree_in(&tmp, PASSWORD)
        .args(["set", "visible-label", "visible-secret"])
        .assert()
        .success();

    let raw = std::fs::read(tmp.child("secrets.ktree").path()).unwrap();
    for needle in [&b"visible-label"[..], b"visible-secret", b"KTRE"] {
        assert!(!raw.windows(needle.len()).any(|w| w == needle));
    }
}

#[test]
fn get_missing_path_fails() {
    let tmp = TempDir::new().unwrap();

    keytree_in(&tmp, PASSWORD)
        .args(["set", "a", "1"])
        .assert()
        .success();

    keytree_in(&tmp, PASSWORD)
        .args(["get", "b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No entry at 'b'"));
}

#[test]
fn tree_shows_structure_without_values() {
    let tmp = TempDir::new().unwrap();

    keytree_in(&tmp, PASSWORD)
        .args(["set", "email/gmail", "gmail-secret"])
        .assert()
        .success();
    keytree_in(&tmp, PASSWORD)
        .args(["set", "email/work", "work-secret"])
        .assert()
        .success();

    keytree_in(&tmp, PASSWORD)
        .arg("tree")
        .assert()
        .success()
        .stdout(predicate::str::contains("email/"))
        .stdout(predicate::str::contains("  gmail *"))
        .stdout(predicate::str::contains("  work *"))
        .stdout(predicate::str::contains("gmail-secret").not())
        .stdout(predicate::str::contains("work-secret").not());
}

#[test]
fn delete_force_prunes_empty_parents() {
    let tmp = TempDir::new().unwrap();

    keytree_in(&tmp, PASSWORD)
        .args(["set", "a/b/c", "x"])
        .assert()
        .success();

    keytree_in(&tmp, PASSWORD)
        .args(["delete", "a/b/c", "--force"])
        .assert()
        .success();

    keytree_in(&tmp, PASSWORD)
        .arg("tree")
        .assert()
        .success()
        .stdout(predicate::str::contains("a/").not());
}

#[test]
fn wrong_password_fails() {
    let tmp = TempDir::new().unwrap();

    keytree_in(&tmp, PASSWORD)
        .args(["set", "k", "v"])
        .assert()
        .success();

    keytree_in(&tmp, "not-the-password")
        .args(["get", "k"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Decryption failed"));
}

#[test]
fn short_password_rejected_for_new_store() {
    let tmp = TempDir::new().unwrap();

    keytree_in(&tmp, "short")
        .args(["set", "k", "v"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 8 characters"));

    tmp.child("secrets.ktree").assert(predicate::path::missing());
}

#[test]
fn rotate_switches_password() {
    let tmp = TempDir::new().unwrap();
    let new_password = "rotated-password";

    keytree_in(&tmp, PASSWORD)
        .args(["set", "bank/pin", "4321"])
        .assert()
        .success();

    keytree_in(&tmp, PASSWORD)
        .env("KEYTREE_NEW_PASSWORD", new_password)
        .arg("rotate")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 secrets re-encrypted"));

    keytree_in(&tmp, new_password)
        .args(["get", "bank/pin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4321"));

    keytree_in(&tmp, PASSWORD)
        .args(["get", "bank/pin"])
        .assert()
        .failure();
}

#[test]
fn generate_stores_password_of_requested_length() {
    let tmp = TempDir::new().unwrap();

    keytree_in(&tmp, PASSWORD)
        .args(["generate", "web/site", "24", "a1"])
        .assert()
        .success();

    let output = keytree_in(&tmp, PASSWORD)
        .args(["get", "web/site"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let secret = String::from_utf8(output.stdout).unwrap();
    let secret = secret.trim_end();
    assert_eq!(secret.len(), 24);
    assert!(secret
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
}

#[test]
fn search_matches_paths() {
    let tmp = TempDir::new().unwrap();

    keytree_in(&tmp, PASSWORD)
        .args(["set", "email/Gmail", "1"])
        .assert()
        .success();
    keytree_in(&tmp, PASSWORD)
        .args(["set", "bank/checking", "2"])
        .assert()
        .success();

    keytree_in(&tmp, PASSWORD)
        .args(["search", "gmail"])
        .assert()
        .success()
        .stdout(predicate::str::contains("email/Gmail"))
        .stdout(predicate::str::contains("bank/checking").not());
}

#[test]
fn shell_runs_commands_from_stdin() {
    let tmp = TempDir::new().unwrap();

    keytree_in(&tmp, PASSWORD)
        .arg("shell")
        .write_stdin("set notes/wifi s3cret\ntree\nbogus\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("wifi *"))
        .stderr(predicate::str::contains("Unknown command 'bogus'"));

    keytree_in(&tmp, PASSWORD)
        .args(["get", "notes/wifi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("s3cret"));
}

#[test]
fn completions_bash() {
    keytree()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("keytree"));
}

#[test]
fn completions_unknown_shell_fails() {
    keytree()
        .args(["completions", "csh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'csh'"));
}
