//! CLI argument definitions and `LaunchSelection` construction.
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};

use super::{resolve_config_path, resolve_profile_name, LaunchSelection};
use crate::launcher::config::DEFAULT_CONFIG_PATH;

/// Parsed command intent from CLI.
#[derive(Debug, Clone)]
pub enum ParsedCommand {
    Launch {
        selection: LaunchSelection,
        dry_run: bool,
    },
    Cli(CliCommand, LaunchSelection),
}

/// Optional utility commands; without one the miner is launched.
#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Print the resolved launch (profile, environment, command line) as JSON.
    Show,
    /// Run read-only checks of the environment the miner would start in.
    Check,
    /// List the available launch profiles.
    Profiles,
    /// Write a sample launcher.toml holding the built-in profiles.
    #[command(after_help = "Hint: use `miner-launcher init --dry-run` to preview without writing.")]
    Init(InitArgs),
}

/// Arguments for `init`.
#[derive(Debug, Clone, Args)]
pub struct InitArgs {
    /// Destination of the sample configuration.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub path: PathBuf,
    /// Overwrite an existing file.
    #[arg(long, default_value_t = false)]
    pub force: bool,
    /// Show the planned write without touching files.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "miner-launcher",
    author,
    version,
    about = "Activate the miner virtualenv and start neurons/miner.py with a launch profile",
    long_about = None
)]
pub struct LaunchArgs {
    /// Launch profile (overrides MINER_LAUNCHER_PROFILE; default `start`).
    #[arg(short, long = "profile")]
    pub profile_override: Option<String>,
    /// Path to launcher.toml (overrides MINER_LAUNCHER_CONFIG).
    #[arg(short, long = "config")]
    pub config_override: Option<PathBuf>,
    /// Print the command line instead of starting the miner.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
    /// Optional CLI command mode.
    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

impl LaunchArgs {
    /// Build a `LaunchSelection` from CLI args and environment variables.
    pub fn build(&self) -> Result<LaunchSelection> {
        let (config_path, config_source) = resolve_config_path(self.config_override.clone())?;
        let (profile, profile_source) = resolve_profile_name(self.profile_override.clone());

        Ok(LaunchSelection {
            config_path,
            config_source,
            profile,
            profile_source,
        })
    }

    /// Parse CLI args into either launch mode or utility command mode.
    pub fn into_command(self) -> Result<ParsedCommand> {
        let selection = self.build()?;
        match self.command {
            Some(command) => {
                if self.dry_run {
                    return Err(anyhow!(
                        "--dry-run only applies when launching; use `show` to inspect a profile"
                    ));
                }
                Ok(ParsedCommand::Cli(command, selection))
            }
            None => Ok(ParsedCommand::Launch {
                selection,
                dry_run: self.dry_run,
            }),
        }
    }
}
