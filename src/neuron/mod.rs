//! Miner neuron launch: argument construction, process execution and preflight checks.

pub mod launch;
pub mod preflight;

pub use launch::{run_miner, LaunchConfiguration, LaunchFlag, LaunchPlan, MinerExit};
pub use preflight::{run_preflight, CheckStatus, PreflightCheck, PreflightReport};
