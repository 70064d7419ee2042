//! Integration tests for the `riptide` binary.
//!
//! These exercise argument parsing, configuration handling and error
//! exit codes without a running daemon.
#![allow(clippy::unwrap_used)]

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// `riptide` isolated from the user's environment and configuration.
fn riptide_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("riptide");
    cmd.env("HOME", "/tmp/riptide-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/riptide-cli-test-nonexistent")
        .env_remove("RIPTIDE_SERVER")
        .env_remove("RIPTIDE_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn config_file(body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

const CONFIG: &str = r#"
default_server = "nas"

[servers.nas]
host = "nas.local"
username = "admin"

[servers.attic]
host = "attic.local"
port = 9092
"#;

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_help() {
    let output = riptide_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn help_lists_commands() {
    riptide_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("watch")
            .and(predicate::str::contains("servers"))
            .and(predicate::str::contains("remove")),
    );
}

#[test]
fn start_requires_ids() {
    riptide_cmd().arg("start").assert().code(2);
}

// ── Servers ─────────────────────────────────────────────────────────

#[test]
fn servers_lists_default_first() {
    let file = config_file(CONFIG);
    riptide_cmd()
        .args(["--output", "plain", "servers", "--config"])
        .arg(file.path())
        .assert()
        .success()
        .stdout("nas\nattic\n");
}

#[test]
fn servers_table_shows_urls() {
    let file = config_file(CONFIG);
    riptide_cmd()
        .arg("servers")
        .arg("--config")
        .arg(file.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("http://nas.local:9091/transmission/rpc")
                .and(predicate::str::contains("http://attic.local:9092/transmission/rpc")),
        );
}

#[test]
fn servers_without_config_fails() {
    riptide_cmd()
        .args(["servers", "--config", "/tmp/riptide-cli-test-nonexistent/none.toml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No servers configured"));
}

#[test]
fn unknown_server_is_a_usage_error() {
    let file = config_file(CONFIG);
    riptide_cmd()
        .args(["list", "--server", "elsewhere", "--config"])
        .arg(file.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("elsewhere"));
}

// ── Connection failures ─────────────────────────────────────────────

#[test]
fn unresolvable_host_exits_with_connection_code() {
    let file = config_file(
        r#"
[servers.ghost]
host = "riptide-test.invalid"
"#,
    );
    riptide_cmd()
        .args(["list", "--config"])
        .arg(file.path())
        .assert()
        .code(7)
        .stderr(predicate::str::contains("riptide::connection_failed"));
}
