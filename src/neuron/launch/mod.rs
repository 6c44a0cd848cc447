//! Launch configuration and miner process execution.

pub mod configuration;
pub mod executor;

pub use configuration::{
    LaunchConfiguration, LaunchFlag, AXON_MAX_WORKERS_FLAG, AXON_PORT_FLAG, NETWORK_FLAG,
    PROFILE_FLAGS, SCRAPING_CONFIG_FLAG, WALLET_HOTKEY_FLAG, WALLET_NAME_FLAG,
};
pub use executor::{run_miner, LaunchPlan, MinerExit};
