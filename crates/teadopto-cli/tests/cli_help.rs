use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("teadopto")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("pets"))
        .stdout(predicate::str::contains("adoptions"))
        .stdout(predicate::str::contains("stats"));
}

#[test]
fn test_pets_help_shows_subcommands() {
    cargo_bin_cmd!("teadopto")
        .args(["pets", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("adopt"));
}

#[test]
fn test_unknown_adoption_status_is_rejected() {
    cargo_bin_cmd!("teadopto")
        .args(["adoptions", "status", "3", "maybe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown adoption status"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("teadopto")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1"));
}
