//! Command-line surface

use assert_cmd::Command;
use predicates::prelude::*;

fn bin() -> Command {
    Command::cargo_bin("inspector-bridge").unwrap()
}

#[test]
fn version_flag_prints_package_version() {
    bin()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn help_lists_subcommands() {
    bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("listen"))
        .stdout(predicate::str::contains("demo"));
}

#[test]
fn demo_rejects_non_websocket_url() {
    let data_dir = tempfile::tempdir().unwrap();
    bin()
        .args(["--data-dir"])
        .arg(data_dir.path())
        .args(["demo", "--url", "http://localhost:9229", "--rounds", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ws://"));
}
