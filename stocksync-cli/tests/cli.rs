use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::TempDir;

const LOG_CSV: &str = "\
timestamp,sku,inventory_item_id,quantity,result,message
2024-07-01T12:00:00Z,ABC123,111,5,ok,
2024-07-01T12:00:01Z,XYZ999,333,0,error,HTTP 422: not stocked
2024-07-01T12:00:02Z,LAST01,444,7,ok,
";

/// Binary with an empty environment and `home` as its home directory.
fn stocksync_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("stocksync"));
    cmd.env_clear()
        .env("HOME", home)
        .env("USERPROFILE", home)
        .env("NO_COLOR", "1");
    cmd
}

fn write_config(dir: &Path, extra: &str) -> std::path::PathBuf {
    let path = dir.join("config.yaml");
    fs::write(
        &path,
        format!(
            "shop: adopt1toy.myshopify.com\ntoken: shpat_test\nfeed_url: http://127.0.0.1:9/feed.csv\nfeed_timeout_secs: 5\n{extra}"
        ),
    )
    .expect("write config");
    path
}

#[test]
fn help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    stocksync_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("run"))
        .stdout(contains("plan"))
        .stdout(contains("locations"))
        .stdout(contains("watch"))
        .stdout(contains("log"));
}

#[test]
fn missing_configuration_is_fatal_before_any_request() {
    let home = TempDir::new().unwrap();
    stocksync_cmd(home.path())
        .arg("run")
        .assert()
        .code(1)
        .stderr(contains("error"))
        .stderr(contains("SHOPIFY_SHOP"));
}

#[test]
fn invalid_config_value_is_reported() {
    let home = TempDir::new().unwrap();
    let config = write_config(home.path(), "update_policy: sometimes\n");
    stocksync_cmd(home.path())
        .args(["run", "--config"])
        .arg(&config)
        .assert()
        .code(1)
        .stderr(contains("UPDATE_POLICY"));
}

#[test]
fn unreachable_feed_exits_with_failure() {
    let home = TempDir::new().unwrap();
    let config = write_config(home.path(), "");
    stocksync_cmd(home.path())
        .args(["run", "--config"])
        .arg(&config)
        .assert()
        .code(1)
        .stderr(contains("feed unavailable"));
}

#[test]
fn log_prints_tail_of_configured_run_log() {
    let home = TempDir::new().unwrap();
    let log = home.path().join("run.csv");
    fs::write(&log, LOG_CSV).unwrap();
    let config = write_config(
        home.path(),
        &format!("run_log_path: {}\n", log.display()),
    );

    stocksync_cmd(home.path())
        .args(["log", "--lines", "2", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(contains("XYZ999"))
        .stdout(contains("LAST01"))
        .stdout(contains("not stocked"))
        .stdout(contains("ABC123").not());
}

#[test]
fn log_with_explicit_path_needs_no_configuration() {
    let home = TempDir::new().unwrap();
    let log = home.path().join("run.csv");
    fs::write(&log, LOG_CSV).unwrap();

    stocksync_cmd(home.path())
        .args(["log", "--path"])
        .arg(&log)
        .assert()
        .success()
        .stdout(contains("ABC123"));
}

#[test]
fn log_without_configured_path_fails() {
    let home = TempDir::new().unwrap();
    let config = write_config(home.path(), "");
    stocksync_cmd(home.path())
        .args(["log", "--config"])
        .arg(&config)
        .assert()
        .code(1)
        .stderr(contains("RUN_LOG_PATH"));
}

#[test]
fn oversized_watch_interval_is_rejected() {
    let home = TempDir::new().unwrap();
    stocksync_cmd(home.path())
        .args(["watch", "--interval-minutes", "400000000000000000"])
        .assert()
        .failure()
        .stderr(contains("interval-minutes"));
}

#[test]
fn oversized_configured_interval_is_invalid() {
    let home = TempDir::new().unwrap();
    let config = write_config(home.path(), "sync_interval_minutes: 400000000000000000\n");
    stocksync_cmd(home.path())
        .args(["watch", "--config"])
        .arg(&config)
        .assert()
        .code(1)
        .stderr(contains("SYNC_INTERVAL_MINUTES"));
}
