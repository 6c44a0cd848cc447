use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use anyhow::{Context, Result};
use serde_json::Value;
use tempfile::TempDir;

pub const BINARY_PATH: &str = env!("CARGO_BIN_EXE_miner-launcher");

/// Stand-in for `neurons/miner.py`, run by `/bin/sh` through the fake interpreter.
const FAKE_MINER: &str = r#"printf '%s\n' "$@" > "$ARGS_OUT"
printf '%s' "$VIRTUAL_ENV" > "$VENV_OUT"
exit ${FAKE_EXIT:-0}
"#;

pub fn fixture(relative: &str) -> String {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    root.join(relative).display().to_string()
}

/// Miner checkout in a temporary directory, optionally with a virtualenv.
pub struct MinerCheckout {
    pub dir: TempDir,
}

impl MinerCheckout {
    pub fn new(with_venv: bool) -> Result<Self> {
        Self::with_miner(with_venv, FAKE_MINER)
    }

    /// Checkout whose `neurons/miner.py` is the given shell script.
    pub fn with_miner(with_venv: bool, script: &str) -> Result<Self> {
        let dir = tempfile::tempdir().context("failed to create checkout directory")?;
        let neurons = dir.path().join("neurons");
        fs::create_dir_all(&neurons).context("failed to create neurons directory")?;
        fs::write(neurons.join("miner.py"), script).context("failed to write fake miner")?;

        if with_venv {
            let bin = dir.path().join("venv/bin");
            fs::create_dir_all(&bin).context("failed to create venv bin directory")?;
            #[cfg(unix)]
            std::os::unix::fs::symlink("/bin/sh", bin.join("python"))
                .context("failed to link fake interpreter")?;
        }
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn args_file(&self) -> PathBuf {
        self.path().join("args.out")
    }

    pub fn venv_file(&self) -> PathBuf {
        self.path().join("venv.out")
    }

    /// Launcher command running inside the checkout with a clean selection environment.
    pub fn command(&self) -> Command {
        let mut command = Command::new(BINARY_PATH);
        command
            .current_dir(self.path())
            .env_remove("MINER_LAUNCHER_CONFIG")
            .env_remove("MINER_LAUNCHER_PROFILE")
            .env("RUST_LOG", "warn")
            .env("ARGS_OUT", self.args_file())
            .env("VENV_OUT", self.venv_file());
        command
    }

    pub fn run(&self, args: &[&str]) -> Result<Output> {
        self.command()
            .args(args)
            .output()
            .context("failed to run miner-launcher")
    }

    /// Arguments the fake miner received, one per line.
    pub fn recorded_args(&self) -> Result<Vec<String>> {
        let raw = fs::read_to_string(self.args_file()).context("fake miner did not run")?;
        Ok(raw.lines().map(str::to_string).collect())
    }
}

pub fn expected_args(config_file: &str, port: &str, workers: &str) -> Vec<String> {
    [
        "--subtensor.network",
        "local",
        "--wallet.name",
        "my_coldkey",
        "--wallet.hotkey",
        "my_first_hotkey",
        "--neuron.scraping_config_file",
        config_file,
        "--axon.port",
        port,
        "--axon.max_workers",
        workers,
        "--logging.trace",
        "--logging.debug",
    ]
    .iter()
    .map(|arg| arg.to_string())
    .collect()
}

/// Last JSON object the launcher printed on stderr.
pub fn structured_error(stderr: &[u8]) -> Option<Value> {
    String::from_utf8_lossy(stderr)
        .lines()
        .rev()
        .find_map(|line| serde_json::from_str::<Value>(line).ok())
}
