use crate::repo;
use anyhow::Result;
use std::path::Path;
use std::process::{Command, Stdio};

pub fn run(skip_release: bool) -> Result<()> {
    let root = repo::repo_root()?;
    run_step(&root, "cargo fetch", &["fetch"])?;
    run_step(&root, "cargo check --workspace", &["check", "--workspace"])?;
    run_step(&root, "cargo test --workspace", &["test", "--workspace"])?;
    run_step(&root, "cargo fmt --all -- --check", &["fmt", "--all", "--", "--check"])?;
    run_step(
        &root,
        "cargo clippy --workspace --all-targets -- -D warnings",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )?;
    // Built-in profiles only; the dry run never starts the miner.
    run_step(
        &root,
        "miner-launcher --dry-run",
        &["run", "--quiet", "--bin", "miner-launcher", "--", "--dry-run"],
    )?;
    if !skip_release {
        run_step(&root, "cargo build --release", &["build", "--release"])?;
    }
    Ok(())
}

fn run_step(root: &Path, label: &str, args: &[&str]) -> Result<()> {
    eprintln!("==> {label}");
    let status = Command::new("cargo")
        .args(args)
        .current_dir(root)
        .env_remove("MINER_LAUNCHER_CONFIG")
        .env_remove("MINER_LAUNCHER_PROFILE")
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        anyhow::bail!("{label} failed (status {status})");
    }
    Ok(())
}
