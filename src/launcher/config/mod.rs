//! Load and validate launcher configuration.
use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::lib::errors::ConfigError;

pub mod environment;
pub mod profiles;
pub mod telemetry;

pub use environment::{
    parse_environment_section, EnvVar, EnvironmentSection, RawEnvironmentSection,
    DEFAULT_INTERPRETER, DEFAULT_PROGRAM, DEFAULT_VENV_DIR,
};
pub use profiles::{
    builtin_profiles, check_profile_names, parse_profiles_section, LoggingFlag, MinerProfile,
    ProfileOrigin, RawProfile, DEFAULT_PROFILE,
};

pub const CONFIG_ENV_KEY: &str = "MINER_LAUNCHER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "launcher.toml";

/// Top-level configuration container.
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub environment: EnvironmentSection,
    pub profiles: BTreeMap<String, MinerProfile>,
    /// `None` when running on the built-in configuration only.
    pub source_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RawLauncherConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<RawEnvironmentSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profiles: Option<BTreeMap<String, RawProfile>>,
}

impl LauncherConfig {
    /// Configuration equivalent to the shipped start scripts.
    pub fn builtin() -> Self {
        Self {
            environment: EnvironmentSection::default(),
            profiles: builtin_profiles(),
            source_path: None,
        }
    }

    /// Load from `path`, or fall back to the built-in configuration.
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => {
                telemetry::log_builtin();
                Ok(Self::builtin())
            }
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        info!(
            target: "miner_launcher::config",
            path = %path.display(),
            "Starting configuration load"
        );

        if !path.is_file() {
            let error = ConfigError::NotFound { path: path.clone() };
            error!(
                target: "miner_launcher::config",
                path = %path.display(),
                reason = %error,
                "Configuration file not found"
            );
            return Err(error);
        }

        let text = std::fs::read_to_string(&path).map_err(|source| {
            let error = ConfigError::Io {
                path: path.clone(),
                source,
            };
            error!(
                target: "miner_launcher::config",
                path = %path.display(),
                reason = %error,
                "Failed to read configuration file"
            );
            error
        })?;

        // The file is TOML whatever its extension.
        let builder = config::Config::builder()
            .add_source(config::File::from_str(&text, config::FileFormat::Toml));
        let document = builder.build().map_err(|err| {
            let error = ConfigError::from_read_error(path.clone(), err);
            error!(
                target: "miner_launcher::config",
                path = %path.display(),
                reason = %error,
                "Failed to read configuration file"
            );
            error
        })?;

        // `config` folds table keys to lowercase; profile names are checked as written.
        check_profile_names(&text, &path).map_err(|err| {
            error!(
                target: "miner_launcher::config",
                path = %path.display(),
                reason = %err,
                "Failed to validate configuration file"
            );
            err
        })?;

        let raw: RawLauncherConfig = document.try_deserialize().map_err(|err| {
            let error = ConfigError::from_parse_error(path.clone(), err);
            error!(
                target: "miner_launcher::config",
                path = %path.display(),
                reason = %error,
                "Failed to parse configuration file"
            );
            error
        })?;

        let config = Self::from_raw(raw, path.clone()).map_err(|err| {
            error!(
                target: "miner_launcher::config",
                path = %path.display(),
                reason = %err,
                "Failed to validate configuration file"
            );
            err
        })?;

        telemetry::log_loaded(&config);
        Ok(config)
    }

    fn from_raw(raw: RawLauncherConfig, path: PathBuf) -> Result<Self, ConfigError> {
        let environment = parse_environment_section(raw.environment, &path)?;
        let profiles = parse_profiles_section(raw.profiles, &path)?;

        Ok(Self {
            environment,
            profiles,
            source_path: Some(path),
        })
    }

    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&MinerProfile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                name: name.to_string(),
                available: self.profile_names(),
            })
    }

    pub fn profile_names(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }
}

/// Render a sample `launcher.toml` holding the built-in configuration.
pub fn sample_document() -> Result<String, toml::ser::Error> {
    let defaults = EnvironmentSection::default();
    let raw = RawLauncherConfig {
        environment: Some(RawEnvironmentSection {
            venv_dir: Some(defaults.venv_dir),
            interpreter: Some(defaults.interpreter),
            program: Some(defaults.program),
            working_dir: None,
            env: None,
        }),
        profiles: Some(
            builtin_profiles()
                .values()
                .map(|profile| (profile.name.clone(), RawProfile::from(profile)))
                .collect(),
        ),
    };
    toml::to_string_pretty(&raw)
}
