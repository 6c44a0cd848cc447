use std::env;
use std::path::{Path, PathBuf};

/// Walk up from the current directory to the workspace holding `miner-launcher`.
pub fn repo_root() -> anyhow::Result<PathBuf> {
    let mut dir = env::current_dir()?;
    loop {
        if is_launcher_workspace(&dir) {
            return Ok(dir);
        }
        if !dir.pop() {
            anyhow::bail!("failed to find the miner-launcher workspace (no Cargo.toml with [workspace])");
        }
    }
}

fn is_launcher_workspace(dir: &Path) -> bool {
    std::fs::read_to_string(dir.join("Cargo.toml"))
        .map(|manifest| manifest.contains("[workspace]"))
        .unwrap_or(false)
}
