//! Miner launch flow and process exit handling.
mod startup;
mod summary;

pub use startup::{run_launch, RuntimeExit};
pub use summary::build_summary;
