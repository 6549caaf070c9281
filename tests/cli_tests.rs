//! CLI integration tests against a throwaway database.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("parimarket");
        cmd.current_dir(self.dir.path())
            .env_remove("PARIMARKET_DATABASE_URL")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.dir.path().join("parimarket.toml"))
            .arg("--database")
            .arg(self.dir.path().join("market.db"));
        cmd
    }

    /// Run with `--json` and parse the single document on stdout.
    fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd().arg("--json").args(args).output().expect("run parimarket");
        assert!(
            output.status.success(),
            "{args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("stdout is one JSON document")
    }
}

#[test]
fn help_lists_market_commands() {
    cargo_bin_cmd!("parimarket")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("buy"))
        .stdout(predicate::str::contains("sell"))
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("portfolio"));
}

#[test]
fn full_market_round_trip() {
    let ws = Workspace::new();

    let alice = ws.json(&["user", "add", "alice"]);
    assert_eq!(alice["user"]["balance"], 1000);
    let alice_id = alice["user"]["id"].as_i64().unwrap().to_string();
    let bob = ws.json(&["user", "add", "bob"]);
    let bob_id = bob["user"]["id"].as_i64().unwrap().to_string();

    let created = ws.json(&["event", "create", "Will it rain?"]);
    let event_id = created["event"]["id"].as_i64().unwrap().to_string();
    let yes = created["odds"][0]["outcome_id"].as_i64().unwrap().to_string();
    let no = created["odds"][1]["outcome_id"].as_i64().unwrap().to_string();

    let bought = ws.json(&[
        "buy", "--user", &alice_id, "--event", &event_id, "--outcome", &yes, "100",
    ]);
    assert_eq!(bought["balance"], 900);
    ws.json(&["buy", "--user", &bob_id, "--event", &event_id, "--outcome", &no, "50"]);

    let portfolio = ws.json(&["portfolio", &alice_id]);
    assert_eq!(portfolio["portfolio"]["active_markets"], 1);
    assert_eq!(portfolio["portfolio"]["total_potential"], 200);

    let resolved = ws.json(&["resolve", &event_id, "--winner", &yes]);
    assert_eq!(resolved["settlement"], "paid");

    let balance = ws.json(&["user", "balance", &alice_id]);
    assert_eq!(balance["user"]["balance"], 1100);

    let activity = ws.json(&["activity", "--limit", "1"]);
    assert_eq!(
        activity["entries"][0]["message"],
        "alice won 200 pts from 'Will it rain?'"
    );
}

#[test]
fn rule_violation_exits_with_client_code() {
    let ws = Workspace::new();
    ws.json(&["user", "add", "alice"]);
    ws.json(&["event", "create", "Rain?"]);

    ws.cmd()
        .args(["buy", "--user", "1", "--event", "1", "--outcome", "1", "5000"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("insufficient balance"));
}

#[test]
fn out_of_range_balance_is_rejected() {
    let ws = Workspace::new();
    ws.json(&["user", "add", "alice"]);

    for set in ["--set=-500", "--set=9223372036854775807"] {
        ws.cmd()
            .args(["user", "balance", "1", set])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("balance must be between"));
    }
    let alice = ws.json(&["user", "balance", "1"]);
    assert_eq!(alice["user"]["balance"], 1000);
}

#[test]
fn unknown_event_is_a_client_error() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["--json", "odds", "42"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("\"error\""));
}

#[test]
fn init_keeps_existing_config_without_force() {
    let ws = Workspace::new();

    let first = ws.json(&["init"]);
    assert_eq!(first["config_written"], true);
    assert!(ws.dir.path().join("parimarket.toml").exists());
    assert!(ws.dir.path().join("market.db").exists());

    let second = ws.json(&["init"]);
    assert_eq!(second["config_written"], false);

    let forced = ws.json(&["init", "--force"]);
    assert_eq!(forced["config_written"], true);
}

#[test]
fn quiet_mode_prints_nothing_on_success() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["--quiet", "user", "add", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn human_output_shows_odds_table() {
    let ws = Workspace::new();
    ws.json(&["event", "create", "Who wins?", "--kind", "multi", "-o", "Red", "-o", "Blue"]);

    ws.cmd()
        .args(["odds", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Red"))
        .stdout(predicate::str::contains("Blue"));
}
