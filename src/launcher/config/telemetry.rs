use std::path::Path;

use tracing::{debug, info};

use super::{LauncherConfig, CONFIG_ENV_KEY, DEFAULT_CONFIG_PATH};

pub fn log_env_source(path: &Path, from_env: bool) {
    if from_env {
        info!(
            target: "miner_launcher::config",
            path = %path.display(),
            "Loading configuration using MINER_LAUNCHER_CONFIG environment variable"
        );
    } else {
        debug!(
            target: "miner_launcher::config",
            path = %path.display(),
            env = CONFIG_ENV_KEY,
            "Loading configuration from command line override"
        );
    }
}

pub fn log_builtin() {
    debug!(
        target: "miner_launcher::config",
        env = CONFIG_ENV_KEY,
        default = DEFAULT_CONFIG_PATH,
        "No configuration file found; using built-in profiles"
    );
}

pub fn log_loaded(config: &LauncherConfig) {
    let path = config
        .source_path
        .as_deref()
        .map(|path| path.display().to_string())
        .unwrap_or_default();
    info!(
        target: "miner_launcher::config",
        path = %path,
        venv_dir = %config.environment.venv_dir.display(),
        interpreter = %config.environment.interpreter,
        program = %config.environment.program.display(),
        profiles = config.profiles.len(),
        extra_env = config.environment.vars.len(),
        "Configuration file loaded successfully"
    );
}
