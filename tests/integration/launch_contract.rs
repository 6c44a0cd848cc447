#![cfg(unix)]

use std::{
    fs,
    process::{Child, ExitStatus},
    thread,
    time::{Duration, Instant},
};

use anyhow::{bail, Result};

use crate::common::{expected_args, fixture, structured_error, MinerCheckout};

/// Miner that announces itself, then runs until SIGTERM and exits 42.
const TRAPPING_MINER: &str = r#"printf '%s\n' "$@" > "$ARGS_OUT"
trap 'exit 42' TERM
while :; do sleep 0.05; done
"#;

fn wait_until(deadline: Duration, mut ready: impl FnMut() -> bool) -> bool {
    let started = Instant::now();
    while started.elapsed() < deadline {
        if ready() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    false
}

fn wait_for_exit(child: &mut Child, deadline: Duration) -> Result<ExitStatus> {
    let started = Instant::now();
    while started.elapsed() < deadline {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        thread::sleep(Duration::from_millis(20));
    }
    child.kill()?;
    bail!("launcher did not exit within {deadline:?}")
}

fn send_signal(child: &Child, signal: libc::c_int) {
    let result = unsafe { libc::kill(child.id() as libc::pid_t, signal) };
    assert_eq!(result, 0, "failed to signal the launcher");
}

/// Start the launcher with the trapping miner and wait until the miner runs.
fn spawn_running_miner(checkout: &MinerCheckout) -> Result<Child> {
    let mut child = checkout.command().spawn()?;
    if !wait_until(Duration::from_secs(10), || checkout.args_file().exists()) {
        child.kill()?;
        bail!("fake miner never started");
    }
    // Let the launcher finish installing its signal handlers.
    thread::sleep(Duration::from_millis(200));
    Ok(child)
}

#[test]
fn start_profile_passes_fixed_flags() -> Result<()> {
    let checkout = MinerCheckout::new(true)?;

    let output = checkout.run(&[])?;

    assert!(output.status.success(), "launch failed: {output:?}");
    assert_eq!(
        checkout.recorded_args()?,
        expected_args("./scraping/config/my_config.json", "9701", "32")
    );
    Ok(())
}

#[test]
fn start5_profile_passes_its_own_flags() -> Result<()> {
    let checkout = MinerCheckout::new(true)?;

    let output = checkout.run(&["--profile", "start5"])?;

    assert!(output.status.success(), "launch failed: {output:?}");
    assert_eq!(
        checkout.recorded_args()?,
        expected_args("./scraping/config/miner_11301.json", "9705", "128")
    );
    Ok(())
}

#[test]
fn profile_env_var_selects_profile() -> Result<()> {
    let checkout = MinerCheckout::new(true)?;

    let output = checkout
        .command()
        .env("MINER_LAUNCHER_PROFILE", "start5")
        .output()?;

    assert!(output.status.success(), "launch failed: {output:?}");
    assert!(checkout
        .recorded_args()?
        .windows(2)
        .any(|pair| pair == ["--axon.port", "9705"]));
    Ok(())
}

#[test]
fn miner_sees_activated_virtualenv() -> Result<()> {
    let checkout = MinerCheckout::new(true)?;

    let output = checkout.run(&[])?;

    assert!(output.status.success(), "launch failed: {output:?}");
    let recorded = fs::read_to_string(checkout.venv_file())?;
    let expected = checkout.path().canonicalize()?.join("venv");
    assert_eq!(recorded, expected.to_string_lossy());
    Ok(())
}

#[test]
fn miner_exit_code_is_propagated() -> Result<()> {
    let checkout = MinerCheckout::new(true)?;

    let output = checkout.command().env("FAKE_EXIT", "3").output()?;

    assert_eq!(output.status.code(), Some(3));
    Ok(())
}

#[test]
fn missing_interpreter_exits_like_a_shell() -> Result<()> {
    let checkout = MinerCheckout::new(false)?;
    fs::write(
        checkout.path().join("launcher.toml"),
        "[environment]\ninterpreter = \"no-such-python-interpreter\"\n",
    )?;

    let output = checkout.command().env("PATH", "/nonexistent").output()?;

    assert_eq!(output.status.code(), Some(127));
    let payload = structured_error(&output.stderr).expect("structured error on stderr");
    assert_eq!(payload["code"], "interpreter_not_found");
    Ok(())
}

#[test]
fn unknown_profile_fails_without_starting_miner() -> Result<()> {
    let checkout = MinerCheckout::new(true)?;

    let output = checkout.run(&["--profile", "start9"])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(!checkout.args_file().exists());
    let payload = structured_error(&output.stderr).expect("structured error on stderr");
    assert_eq!(payload["code"], "config_invalid");
    assert!(payload["details"]["reason"]
        .as_str()
        .unwrap_or_default()
        .contains("start9"));
    Ok(())
}

#[test]
fn dry_run_with_unknown_profile_reports_structured_error() -> Result<()> {
    let checkout = MinerCheckout::new(true)?;

    let output = checkout
        .command()
        .args(["--dry-run", "--profile", "start9"])
        .env("RUST_BACKTRACE", "1")
        .output()?;

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let payload = structured_error(&output.stderr).expect("structured error on stderr");
    assert_eq!(payload["code"], "config_invalid");
    assert!(!String::from_utf8_lossy(&output.stderr).contains("Stack backtrace"));
    Ok(())
}

#[test]
fn sigterm_is_forwarded_to_miner() -> Result<()> {
    let checkout = MinerCheckout::with_miner(true, TRAPPING_MINER)?;
    let mut child = spawn_running_miner(&checkout)?;

    send_signal(&child, libc::SIGTERM);

    let status = wait_for_exit(&mut child, Duration::from_secs(10))?;
    assert_eq!(status.code(), Some(42));
    Ok(())
}

#[test]
fn sigint_does_not_stop_the_launcher() -> Result<()> {
    let checkout = MinerCheckout::with_miner(true, TRAPPING_MINER)?;
    let mut child = spawn_running_miner(&checkout)?;

    send_signal(&child, libc::SIGINT);
    thread::sleep(Duration::from_millis(500));
    assert!(
        child.try_wait()?.is_none(),
        "launcher must keep waiting for the miner after SIGINT"
    );

    send_signal(&child, libc::SIGTERM);
    let status = wait_for_exit(&mut child, Duration::from_secs(10))?;
    assert_eq!(status.code(), Some(42));
    Ok(())
}

#[test]
fn dry_run_prints_command_without_starting_miner() -> Result<()> {
    let checkout = MinerCheckout::new(true)?;

    let output = checkout.run(&["--dry-run"])?;

    assert!(output.status.success(), "dry-run failed: {output:?}");
    assert!(!checkout.args_file().exists());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("neurons/miner.py --subtensor.network local"));
    assert!(stdout.trim_end().ends_with("--logging.trace --logging.debug"));
    Ok(())
}

#[test]
fn file_profile_appends_extra_args() -> Result<()> {
    let checkout = MinerCheckout::new(false)?;
    let venv_bin = checkout.path().join(".venv/bin");
    fs::create_dir_all(&venv_bin)?;
    std::os::unix::fs::symlink("/bin/sh", venv_bin.join("python3"))?;

    let output = checkout
        .command()
        .args(["--profile", "edge"])
        .env(
            "MINER_LAUNCHER_CONFIG",
            fixture("tests/fixtures/launcher_valid.toml"),
        )
        .output()?;

    assert!(output.status.success(), "launch failed: {output:?}");
    let args = checkout.recorded_args()?;
    assert_eq!(args[1], "test");
    assert_eq!(
        &args[args.len() - 3..],
        ["--logging.debug", "--subtensor.chain_endpoint", "ws://127.0.0.1:9944"]
    );
    Ok(())
}
