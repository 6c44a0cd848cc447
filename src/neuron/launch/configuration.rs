use std::fmt;

use serde::Serialize;

use crate::launcher::config::MinerProfile;

pub const NETWORK_FLAG: &str = "--subtensor.network";
pub const WALLET_NAME_FLAG: &str = "--wallet.name";
pub const WALLET_HOTKEY_FLAG: &str = "--wallet.hotkey";
pub const SCRAPING_CONFIG_FLAG: &str = "--neuron.scraping_config_file";
pub const AXON_PORT_FLAG: &str = "--axon.port";
pub const AXON_MAX_WORKERS_FLAG: &str = "--axon.max_workers";

/// Valued flags every profile sets, in emission order.
pub const PROFILE_FLAGS: &[&str] = &[
    NETWORK_FLAG,
    WALLET_NAME_FLAG,
    WALLET_HOTKEY_FLAG,
    SCRAPING_CONFIG_FLAG,
    AXON_PORT_FLAG,
    AXON_MAX_WORKERS_FLAG,
];

/// One command-line flag: `--name value` or a bare `--switch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchFlag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl LaunchFlag {
    fn valued(name: &str, value: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            value: Some(value.to_string()),
        }
    }

    fn switch(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: None,
        }
    }
}

/// Ordered arguments handed to the miner, built once per launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchConfiguration {
    pub profile: String,
    flags: Vec<LaunchFlag>,
    extra_args: Vec<String>,
}

impl LaunchConfiguration {
    pub fn from_profile(profile: &MinerProfile) -> Self {
        let mut flags = vec![
            LaunchFlag::valued(NETWORK_FLAG, &profile.network),
            LaunchFlag::valued(WALLET_NAME_FLAG, &profile.wallet_name),
            LaunchFlag::valued(WALLET_HOTKEY_FLAG, &profile.wallet_hotkey),
            LaunchFlag::valued(
                SCRAPING_CONFIG_FLAG,
                profile.scraping_config_file.display(),
            ),
            LaunchFlag::valued(AXON_PORT_FLAG, profile.axon_port),
            LaunchFlag::valued(AXON_MAX_WORKERS_FLAG, profile.axon_max_workers),
        ];
        flags.extend(
            profile
                .logging
                .iter()
                .map(|logging| LaunchFlag::switch(logging.flag())),
        );

        Self {
            profile: profile.name.clone(),
            flags,
            extra_args: profile.extra_args.clone(),
        }
    }

    pub fn flags(&self) -> &[LaunchFlag] {
        &self.flags
    }

    /// Value of a valued flag, if present.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.flags
            .iter()
            .find(|flag| flag.name == name)
            .and_then(|flag| flag.value.as_deref())
    }

    /// True when `name` appears anywhere in the argument list.
    pub fn contains(&self, name: &str) -> bool {
        self.to_args()
            .iter()
            .any(|arg| arg == name || arg.starts_with(&format!("{name}=")))
    }

    /// Flatten into argv tokens.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.flags.len() * 2 + self.extra_args.len());
        for flag in &self.flags {
            args.push(flag.name.clone());
            if let Some(value) = &flag.value {
                args.push(value.clone());
            }
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

impl fmt::Display for LaunchConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_args().join(" "))
    }
}
