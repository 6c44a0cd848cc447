//! LaunchSelection and config/profile resolution.
use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::launcher::config::{CONFIG_ENV_KEY, DEFAULT_CONFIG_PATH, DEFAULT_PROFILE};

pub const PROFILE_ENV_KEY: &str = "MINER_LAUNCHER_PROFILE";

/// Where a resolved setting came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingSource {
    Cli,
    Env,
    Default,
    /// No configuration file; built-in profiles only.
    Builtin,
}

impl SettingSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SettingSource::Cli => "cli",
            SettingSource::Env => "env",
            SettingSource::Default => "default",
            SettingSource::Builtin => "builtin",
        }
    }
}

/// Which configuration file and profile a command operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSelection {
    pub config_path: Option<PathBuf>,
    pub config_source: SettingSource,
    pub profile: String,
    pub profile_source: SettingSource,
}

/// Resolve config path in the order: CLI override → env var → `./launcher.toml`.
pub fn resolve_config_path(
    override_path: Option<PathBuf>,
) -> Result<(Option<PathBuf>, SettingSource)> {
    let cwd = env::current_dir().context("failed to obtain current directory")?;
    Ok(resolve_config_path_from(
        override_path,
        env::var_os(CONFIG_ENV_KEY),
        &cwd,
    ))
}

/// Resolution with explicit inputs. The default file is optional; explicit paths are
/// returned even when missing so loading can report them.
pub fn resolve_config_path_from(
    override_path: Option<PathBuf>,
    env_value: Option<OsString>,
    cwd: &Path,
) -> (Option<PathBuf>, SettingSource) {
    if let Some(path) = override_path {
        return (Some(absolutize(cwd, path)), SettingSource::Cli);
    }

    if let Some(value) = env_value.filter(|value| !value.is_empty()) {
        return (Some(absolutize(cwd, PathBuf::from(value))), SettingSource::Env);
    }

    let default = cwd.join(DEFAULT_CONFIG_PATH);
    if default.is_file() {
        (Some(default), SettingSource::Default)
    } else {
        (None, SettingSource::Builtin)
    }
}

/// Resolve profile name in the order: CLI override → env var → `start`.
pub fn resolve_profile_name(profile_override: Option<String>) -> (String, SettingSource) {
    resolve_profile_name_from(profile_override, env::var(PROFILE_ENV_KEY).ok())
}

pub fn resolve_profile_name_from(
    profile_override: Option<String>,
    env_value: Option<String>,
) -> (String, SettingSource) {
    if let Some(name) = profile_override.and_then(|v| normalize_name(&v)) {
        return (name, SettingSource::Cli);
    }

    if let Some(name) = env_value.and_then(|v| normalize_name(&v)) {
        return (name, SettingSource::Env);
    }

    (DEFAULT_PROFILE.to_string(), SettingSource::Default)
}

fn normalize_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

fn absolutize(cwd: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}
