//! Shared library modules: errors, file helpers, virtualenv activation, miner command
//! construction and telemetry.

pub mod errors;
pub mod fs;
pub mod miner_command;
pub mod telemetry;
pub mod venv;
