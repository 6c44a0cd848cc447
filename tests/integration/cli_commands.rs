use std::process::Command;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::common::{fixture, structured_error, MinerCheckout, BINARY_PATH};

fn json_stdout(output: &std::process::Output) -> Result<Value> {
    serde_json::from_slice(&output.stdout).context("stdout is not JSON")
}

#[test]
fn profiles_lists_builtin_profiles() -> Result<()> {
    let checkout = MinerCheckout::new(false)?;

    let output = checkout.run(&["profiles"])?;

    assert!(output.status.success(), "profiles failed: {output:?}");
    let payload = json_stdout(&output)?;
    assert_eq!(payload["config_source"], "builtin");
    let names = payload["profiles"]
        .as_array()
        .context("profiles array")?
        .iter()
        .map(|profile| profile["name"].as_str().unwrap_or_default().to_string())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["start", "start5"]);
    assert_eq!(payload["profiles"][0]["selected"], true);
    Ok(())
}

#[test]
fn show_reports_virtualenv_and_command_line() -> Result<()> {
    let checkout = MinerCheckout::new(true)?;

    let output = checkout.run(&["--profile", "start5", "show"])?;

    assert!(output.status.success(), "show failed: {output:?}");
    let payload = json_stdout(&output)?;
    assert_eq!(payload["profile"], "start5");
    assert_eq!(payload["profile_source"], "cli");
    assert_eq!(payload["virtualenv"]["active"], true);
    assert_eq!(payload["command_line"][1], "neurons/miner.py");
    Ok(())
}

#[test]
fn check_fails_when_scraping_config_is_missing() -> Result<()> {
    let checkout = MinerCheckout::new(false)?;

    let output = checkout.run(&["check"])?;

    assert_eq!(output.status.code(), Some(1));
    let payload = json_stdout(&output)?;
    assert_eq!(payload["status"], "failed");
    let scraping = payload["checks"]
        .as_array()
        .context("checks array")?
        .iter()
        .find(|check| check["name"] == "scraping_config")
        .context("scraping_config check")?;
    assert_eq!(scraping["status"], "failed");
    Ok(())
}

#[test]
fn init_dry_run_leaves_checkout_untouched() -> Result<()> {
    let checkout = MinerCheckout::new(false)?;

    let output = checkout.run(&["init", "--dry-run"])?;

    assert!(output.status.success(), "init failed: {output:?}");
    assert_eq!(json_stdout(&output)?["status"], "planned");
    assert!(!checkout.path().join("launcher.toml").exists());
    Ok(())
}

#[test]
fn invalid_config_is_reported() -> Result<()> {
    let output = Command::new(BINARY_PATH)
        .args(["--config", &fixture("tests/fixtures/launcher_invalid_port.toml"), "profiles"])
        .env_remove("MINER_LAUNCHER_PROFILE")
        .output()
        .context("failed to run miner-launcher")?;

    assert_eq!(output.status.code(), Some(1));
    let payload = structured_error(&output.stderr).context("structured error on stderr")?;
    assert_eq!(payload["code"], "config_invalid");
    assert!(payload["details"]["reason"]
        .as_str()
        .unwrap_or_default()
        .contains("profiles.low.axon_port"));
    Ok(())
}

#[test]
fn show_with_unknown_profile_reports_structured_error() -> Result<()> {
    let checkout = MinerCheckout::new(false)?;

    let output = checkout.run(&["--profile", "start9", "show"])?;

    assert_eq!(output.status.code(), Some(1));
    let payload = structured_error(&output.stderr).context("structured error on stderr")?;
    assert_eq!(payload["code"], "config_invalid");
    Ok(())
}

#[test]
fn config_with_other_extension_is_read_as_toml() -> Result<()> {
    let checkout = MinerCheckout::new(false)?;
    std::fs::copy(
        fixture("tests/fixtures/launcher_valid.toml"),
        checkout.path().join("miner.cfg"),
    )?;

    let output = checkout.run(&["--config", "miner.cfg", "profiles"])?;

    assert!(output.status.success(), "profiles failed: {output:?}");
    let payload = json_stdout(&output)?;
    assert_eq!(payload["config_source"], "cli");
    assert_eq!(payload["profiles"][0]["name"], "edge");
    Ok(())
}

#[test]
fn usage_error_exits_with_one() -> Result<()> {
    let checkout = MinerCheckout::new(false)?;

    let output = checkout.run(&["--no-such-flag"])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--no-such-flag"));
    assert!(!checkout.args_file().exists());
    Ok(())
}

#[test]
fn help_still_exits_successfully() -> Result<()> {
    let checkout = MinerCheckout::new(false)?;

    let output = checkout.run(&["--help"])?;

    assert!(output.status.success(), "--help failed: {output:?}");
    assert!(String::from_utf8_lossy(&output.stdout).contains("--dry-run"));
    Ok(())
}

#[test]
fn piped_logs_carry_no_colour_codes() -> Result<()> {
    let checkout = MinerCheckout::new(false)?;

    let output = checkout.command().arg("show").env("RUST_LOG", "debug").output()?;

    assert!(output.status.success(), "show failed: {output:?}");
    assert!(!output.stderr.is_empty(), "debug logs expected on stderr");
    assert!(
        !output.stderr.contains(&0x1b),
        "stderr contains ANSI escapes: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(())
}
