use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{lib::errors::ConfigError, neuron::launch::PROFILE_FLAGS};

pub const DEFAULT_PROFILE: &str = "start";
pub const MAX_PROFILE_NAME_LEN: usize = 64;
pub const MAX_AXON_WORKERS: u32 = 1024;

/// Verbosity switch forwarded to the miner as `--logging.<name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingFlag {
    Trace,
    Debug,
    Info,
}

impl LoggingFlag {
    pub const fn as_str(&self) -> &'static str {
        match self {
            LoggingFlag::Trace => "trace",
            LoggingFlag::Debug => "debug",
            LoggingFlag::Info => "info",
        }
    }

    pub const fn flag(&self) -> &'static str {
        match self {
            LoggingFlag::Trace => "--logging.trace",
            LoggingFlag::Debug => "--logging.debug",
            LoggingFlag::Info => "--logging.info",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "trace" => Some(LoggingFlag::Trace),
            "debug" => Some(LoggingFlag::Debug),
            "info" => Some(LoggingFlag::Info),
            _ => None,
        }
    }
}

/// Where a profile definition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileOrigin {
    Builtin,
    File,
}

impl fmt::Display for ProfileOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileOrigin::Builtin => f.write_str("builtin"),
            ProfileOrigin::File => f.write_str("file"),
        }
    }
}

/// Validated launch profile: the values of one launch configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinerProfile {
    pub name: String,
    pub origin: ProfileOrigin,
    pub network: String,
    pub wallet_name: String,
    pub wallet_hotkey: String,
    pub scraping_config_file: PathBuf,
    pub axon_port: u16,
    pub axon_max_workers: u32,
    pub logging: Vec<LoggingFlag>,
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_hotkey: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scraping_config_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axon_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axon_max_workers: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_args: Option<Vec<String>>,
}

impl From<&MinerProfile> for RawProfile {
    fn from(profile: &MinerProfile) -> Self {
        Self {
            network: Some(profile.network.clone()),
            wallet_name: Some(profile.wallet_name.clone()),
            wallet_hotkey: Some(profile.wallet_hotkey.clone()),
            scraping_config_file: Some(profile.scraping_config_file.clone()),
            axon_port: Some(profile.axon_port),
            axon_max_workers: Some(profile.axon_max_workers),
            logging: Some(
                profile
                    .logging
                    .iter()
                    .map(|flag| flag.as_str().to_string())
                    .collect(),
            ),
            extra_args: Some(profile.extra_args.clone()),
        }
    }
}

/// Profiles matching the two shipped start scripts.
pub fn builtin_profiles() -> BTreeMap<String, MinerProfile> {
    let start = builtin(
        "start",
        "./scraping/config/my_config.json",
        9701,
        32,
    );
    let start5 = builtin(
        "start5",
        "./scraping/config/miner_11301.json",
        9705,
        128,
    );
    [start, start5]
        .into_iter()
        .map(|profile| (profile.name.clone(), profile))
        .collect()
}

fn builtin(name: &str, scraping_config_file: &str, axon_port: u16, workers: u32) -> MinerProfile {
    MinerProfile {
        name: name.to_string(),
        origin: ProfileOrigin::Builtin,
        network: "local".to_string(),
        wallet_name: "my_coldkey".to_string(),
        wallet_hotkey: "my_first_hotkey".to_string(),
        scraping_config_file: PathBuf::from(scraping_config_file),
        axon_port,
        axon_max_workers: workers,
        logging: vec![LoggingFlag::Trace, LoggingFlag::Debug],
        extra_args: Vec::new(),
    }
}

/// Merge file-defined profiles over the built-ins.
pub fn parse_profiles_section(
    raw: Option<BTreeMap<String, RawProfile>>,
    path: &Path,
) -> Result<BTreeMap<String, MinerProfile>, ConfigError> {
    let mut profiles = builtin_profiles();
    for (name, raw_profile) in raw.unwrap_or_default() {
        let profile = parse_profile(&name, raw_profile, path)?;
        profiles.insert(name, profile);
    }
    Ok(profiles)
}

/// Validate profile names as they are spelled in the TOML `text`.
pub fn check_profile_names(text: &str, path: &Path) -> Result<(), ConfigError> {
    let document: toml::Table = toml::from_str(text)
        .map_err(|err| ConfigError::invalid(path, "profiles", err.message().to_string()))?;
    if let Some(toml::Value::Table(profiles)) = document.get("profiles") {
        for name in profiles.keys() {
            validate_profile_name(name, path)?;
        }
    }
    Ok(())
}

fn parse_profile(name: &str, raw: RawProfile, path: &Path) -> Result<MinerProfile, ConfigError> {
    validate_profile_name(name, path)?;
    let field = |key: &str| format!("profiles.{name}.{key}");

    let network = required_string(raw.network, path, field("network"))?;
    let wallet_name = required_string(raw.wallet_name, path, field("wallet_name"))?;
    let wallet_hotkey = required_string(raw.wallet_hotkey, path, field("wallet_hotkey"))?;

    let scraping_config_file = raw
        .scraping_config_file
        .ok_or_else(|| ConfigError::missing(path, field("scraping_config_file")))?;
    if scraping_config_file.as_os_str().is_empty() {
        return Err(ConfigError::invalid(
            path,
            field("scraping_config_file"),
            "Provide a path to the scraping config JSON",
        ));
    }

    let axon_port = raw
        .axon_port
        .ok_or_else(|| ConfigError::missing(path, field("axon_port")))?;
    validate_port(axon_port, path, field("axon_port"))?;

    let axon_max_workers = raw
        .axon_max_workers
        .ok_or_else(|| ConfigError::missing(path, field("axon_max_workers")))?;
    if !(1..=MAX_AXON_WORKERS).contains(&axon_max_workers) {
        return Err(ConfigError::invalid(
            path,
            field("axon_max_workers"),
            format!("Specify a value between 1 and {MAX_AXON_WORKERS}"),
        ));
    }

    let logging = parse_logging(raw.logging.unwrap_or_default(), path, field("logging"))?;
    let extra_args = raw.extra_args.unwrap_or_default();
    validate_extra_args(&extra_args, &logging, path, field("extra_args"))?;

    Ok(MinerProfile {
        name: name.to_string(),
        origin: ProfileOrigin::File,
        network,
        wallet_name,
        wallet_hotkey,
        scraping_config_file,
        axon_port,
        axon_max_workers,
        logging,
        extra_args,
    })
}

fn required_string(
    value: Option<String>,
    path: &Path,
    field: String,
) -> Result<String, ConfigError> {
    let value = value.ok_or_else(|| ConfigError::missing(path, field.clone()))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::invalid(path, field, "Value cannot be empty"));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(ConfigError::invalid(
            path,
            field,
            "Value cannot contain whitespace",
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_profile_name(name: &str, path: &Path) -> Result<(), ConfigError> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if name.is_empty() || name.len() > MAX_PROFILE_NAME_LEN || !valid_chars {
        return Err(ConfigError::invalid(
            path,
            format!("profiles.{name}"),
            "Profile names use 1-64 characters from [a-z0-9_-]",
        ));
    }
    Ok(())
}

fn validate_port(port: u16, path: &Path, field: String) -> Result<(), ConfigError> {
    if (1024..=65535).contains(&port) {
        return Ok(());
    }

    Err(ConfigError::invalid(
        path,
        field,
        "Use a port in the range 1024-65535",
    ))
}

fn parse_logging(
    raw: Vec<String>,
    path: &Path,
    field: String,
) -> Result<Vec<LoggingFlag>, ConfigError> {
    let mut flags = Vec::with_capacity(raw.len());
    for entry in raw {
        let flag = LoggingFlag::parse(&entry).ok_or_else(|| {
            ConfigError::invalid(
                path,
                field.clone(),
                format!("Unknown logging flag `{entry}` (use trace, debug or info)"),
            )
        })?;
        if flags.contains(&flag) {
            return Err(ConfigError::invalid(
                path,
                field,
                format!("Logging flag `{entry}` is listed twice"),
            ));
        }
        flags.push(flag);
    }
    Ok(flags)
}

fn validate_extra_args(
    extra_args: &[String],
    logging: &[LoggingFlag],
    path: &Path,
    field: String,
) -> Result<(), ConfigError> {
    for arg in extra_args {
        if arg.trim().is_empty() {
            return Err(ConfigError::invalid(
                path,
                field,
                "Arguments cannot be empty",
            ));
        }
        let flag = arg.split('=').next().unwrap_or(arg);
        let duplicates_profile_flag = PROFILE_FLAGS.contains(&flag)
            || logging.iter().any(|logging_flag| logging_flag.flag() == flag);
        if duplicates_profile_flag {
            return Err(ConfigError::invalid(
                path,
                field,
                format!("`{flag}` is already set by the profile"),
            ));
        }
    }
    Ok(())
}
