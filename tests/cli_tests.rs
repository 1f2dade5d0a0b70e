//! CLI integration tests for the `bitprune` binary.
//!
//! These exercise the compiled binary as a subprocess via `assert_cmd`,
//! asserting on exit code and stdout/stderr content rather than calling the
//! library functions directly.

use assert_cmd::Command;
use predicates::prelude::*;

#[allow(deprecated)]
fn bitprune() -> Command {
    Command::cargo_bin("bitprune").unwrap()
}

#[test]
fn help_shows_all_subcommands() {
    bitprune().arg("--help").assert().success().stdout(
        predicate::str::contains("pq")
            .and(predicate::str::contains("crt"))
            .and(predicate::str::contains("demo"))
            .and(predicate::str::contains("bench")),
    );
}

#[test]
fn help_pq_shows_required_args() {
    bitprune()
        .args(["pq", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--n")
                .and(predicate::str::contains("--known-p"))
                .and(predicate::str::contains("--known-q")),
        );
}

#[test]
fn help_crt_shows_required_args() {
    bitprune()
        .args(["crt", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--n")
                .and(predicate::str::contains("--e"))
                .and(predicate::str::contains("--known-dp"))
                .and(predicate::str::contains("--known-dq")),
        );
}

#[test]
fn pq_recovers_known_factorization() {
    bitprune()
        .args([
            "pq",
            "--n",
            "899",
            "--known-p",
            "?11?1",
            "--known-q",
            "?1?0?",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("p =").and(predicate::str::contains("q =")));
}

#[test]
fn pq_with_inconsistent_bits_fails_with_code_one() {
    bitprune()
        .args([
            "pq",
            "--n",
            "899",
            "--known-p",
            "?11?1",
            "--known-q",
            "?1?1?",
        ])
        .assert()
        .code(1);
}

#[test]
fn pq_rejects_malformed_modulus_with_code_two() {
    bitprune()
        .args([
            "pq",
            "--n",
            "not-a-number",
            "--known-p",
            "?????",
            "--known-q",
            "?????",
        ])
        .assert()
        .code(2);
}

#[test]
fn crt_recovers_known_factorization() {
    bitprune()
        .args([
            "crt",
            "--n",
            "899",
            "--e",
            "17",
            "--known-dp",
            "?0??1",
            "--known-dq",
            "???0?",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("p =").and(predicate::str::contains("dp =")));
}

#[test]
fn demo_runs_all_worked_examples() {
    bitprune().arg("demo").assert().success().stdout(
        predicate::str::contains("BP-PQ")
            .and(predicate::str::contains("BP-CRT")),
    );
}
