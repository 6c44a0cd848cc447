//! CLI entrypoint module structure.
use std::{env, path::Path};

use anyhow::{Context, Result};
use serde_json::{json, Value};

use crate::{
    launcher::config::{sample_document, LauncherConfig, MinerProfile},
    lib::{
        fs::{write_config_file, WriteStatus},
        miner_command::shell_join,
    },
    neuron::{run_preflight, LaunchPlan},
};

pub mod args;
pub mod profile;

pub use args::{CliCommand, InitArgs, LaunchArgs, ParsedCommand};
pub use profile::{
    resolve_config_path, resolve_config_path_from, resolve_profile_name,
    resolve_profile_name_from, LaunchSelection, SettingSource, PROFILE_ENV_KEY,
};

/// Result of a CLI command: a JSON payload for stdout and whether it succeeded.
#[derive(Debug, Clone)]
pub struct CliOutput {
    pub payload: String,
    pub success: bool,
}

impl CliOutput {
    fn ok(payload: &Value) -> Result<Self> {
        Ok(Self {
            payload: serde_json::to_string_pretty(payload)?,
            success: true,
        })
    }
}

/// Execute CLI command mode and return a user-facing result payload.
pub fn execute_cli_command(command: CliCommand, selection: &LaunchSelection) -> Result<CliOutput> {
    let cwd = env::current_dir().context("failed to obtain current directory")?;
    match command {
        CliCommand::Init(args) => init_config(&cwd.join(&args.path), args.force, args.dry_run),
        CliCommand::Show => {
            let config = LauncherConfig::load(selection.config_path.clone())?;
            let profile = config.profile(&selection.profile)?;
            let plan = LaunchPlan::prepare(&config, profile, &cwd);
            CliOutput::ok(&describe_launch(&plan, profile, selection))
        }
        CliCommand::Check => {
            let config = LauncherConfig::load(selection.config_path.clone())?;
            let profile = config.profile(&selection.profile)?;
            let plan = LaunchPlan::prepare(&config, profile, &cwd);
            let report = run_preflight(&plan, profile);
            let payload = json!({
                "status": if report.passed() { "passed" } else { "failed" },
                "profile": report.profile,
                "checks": report.checks,
            });
            Ok(CliOutput {
                payload: serde_json::to_string_pretty(&payload)?,
                success: report.passed(),
            })
        }
        CliCommand::Profiles => {
            let config = LauncherConfig::load(selection.config_path.clone())?;
            let profiles = config
                .profiles
                .values()
                .map(|profile| {
                    json!({
                        "name": profile.name,
                        "origin": profile.origin,
                        "axon_port": profile.axon_port,
                        "axon_max_workers": profile.axon_max_workers,
                        "scraping_config_file": profile.scraping_config_file.to_string_lossy(),
                        "selected": profile.name == selection.profile,
                    })
                })
                .collect::<Vec<_>>();
            CliOutput::ok(&json!({
                "config_path": config_path_value(selection),
                "config_source": selection.config_source.as_str(),
                "profiles": profiles,
            }))
        }
    }
}

/// One-line shell rendering used by `--dry-run`.
pub fn dry_run_line(selection: &LaunchSelection) -> Result<String> {
    let cwd = env::current_dir().context("failed to obtain current directory")?;
    let config = LauncherConfig::load(selection.config_path.clone())?;
    let profile = config.profile(&selection.profile)?;
    let plan = LaunchPlan::prepare(&config, profile, &cwd);
    Ok(shell_join(&plan.command_line()))
}

fn describe_launch(plan: &LaunchPlan, profile: &MinerProfile, selection: &LaunchSelection) -> Value {
    let command_line = plan.command_line();
    json!({
        "profile": profile.name,
        "origin": profile.origin,
        "profile_source": selection.profile_source.as_str(),
        "config_path": config_path_value(selection),
        "config_source": selection.config_source.as_str(),
        "working_dir": plan.working_dir.to_string_lossy(),
        "virtualenv": {
            "dir": plan.venv_dir.to_string_lossy(),
            "active": plan.activation.active,
        },
        "interpreter": plan.activation.interpreter.to_string_lossy(),
        "program": plan.program.to_string_lossy(),
        "flags": plan.launch.flags(),
        "extra_args": profile.extra_args,
        "command_line": command_line,
        "shell": shell_join(&command_line),
    })
}

fn config_path_value(selection: &LaunchSelection) -> Value {
    selection
        .config_path
        .as_ref()
        .map(|path| Value::from(path.to_string_lossy().to_string()))
        .unwrap_or(Value::Null)
}

/// Write the sample configuration and format a JSON response payload.
fn init_config(destination: &Path, force: bool, dry_run: bool) -> Result<CliOutput> {
    let document = sample_document().context("failed to render sample configuration")?;
    let status = write_config_file(destination, &document, force, dry_run).with_context(|| {
        format!(
            "failed to write configuration to {}",
            destination.to_string_lossy()
        )
    })?;

    let (status, message) = match status {
        WriteStatus::Planned => ("planned", "dry-run: no files were modified"),
        WriteStatus::Written => ("written", "sample configuration written"),
        WriteStatus::SkippedExisting => (
            "skipped_existing",
            "configuration already exists; re-run with --force to overwrite",
        ),
    };

    CliOutput::ok(&json!({
        "status": status,
        "path": destination.to_string_lossy(),
        "message": message,
    }))
}
