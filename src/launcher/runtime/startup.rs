use std::{env, process::ExitCode};

use anyhow::Error;
use serde_json::{json, Value};
use tracing::info;

use crate::{
    cli::{LaunchSelection, SettingSource},
    launcher::config::{telemetry as config_telemetry, LauncherConfig},
    lib::{
        errors::{ConfigError, ErrorDescriptor, LaunchError, CONFIG_INVALID},
        telemetry::{emit_launch, LaunchTelemetry},
    },
    neuron::{run_miner, LaunchPlan},
};

use super::build_summary;

/// Bundles a runtime error message with an exit code and optional structured error data.
#[derive(Debug)]
pub struct RuntimeExit {
    message: String,
    exit_code: ExitCode,
    error_data: Option<Value>,
}

impl RuntimeExit {
    pub fn structured(descriptor: &ErrorDescriptor, details: Value, exit_code: ExitCode) -> Self {
        Self {
            message: descriptor.message.to_string(),
            exit_code,
            error_data: Some(descriptor.to_value(details)),
        }
    }

    pub fn from_error(err: impl Into<Error>) -> Self {
        let err = err.into();
        Self {
            message: format!("{err:?}"),
            exit_code: ExitCode::FAILURE,
            error_data: None,
        }
    }

    pub fn from_config_error(err: ConfigError) -> Self {
        Self::structured(
            &CONFIG_INVALID,
            json!({ "reason": err.to_string() }),
            ExitCode::FAILURE,
        )
    }

    /// Errors from CLI command mode; configuration errors keep their structured form.
    pub fn from_cli_error(err: Error) -> Self {
        match err.downcast::<ConfigError>() {
            Ok(config_error) => Self::from_config_error(config_error),
            Err(err) => Self::from_error(err),
        }
    }

    /// Usage errors exit with 1 like every other launcher-side failure.
    pub fn from_usage_error(err: clap::Error) -> Self {
        Self {
            message: err.render().to_string(),
            exit_code: ExitCode::FAILURE,
            error_data: None,
        }
    }

    /// Spawn failures exit like a shell would (127 / 126).
    pub fn from_launch_error(err: LaunchError) -> Self {
        let program = match &err {
            LaunchError::Spawn { program, .. } | LaunchError::Wait { program, .. } => {
                program.to_string_lossy().to_string()
            }
        };
        Self::structured(
            err.descriptor(),
            json!({ "reason": err.to_string(), "program": program }),
            ExitCode::from(err.shell_exit_code()),
        )
    }

    pub fn report(self) -> ExitCode {
        if let Some(data) = self.error_data {
            if let Ok(serialized) = serde_json::to_string(&data) {
                eprintln!("{serialized}");
            } else {
                eprintln!("{}", self.message);
            }
        } else {
            eprintln!("{}", self.message);
        }
        self.exit_code
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }

    pub fn error_data(&self) -> Option<&Value> {
        self.error_data.as_ref()
    }
}

/// Resolve the selected profile, start the miner and return the exit code to use.
pub async fn run_launch(selection: LaunchSelection) -> Result<ExitCode, RuntimeExit> {
    if let Some(path) = &selection.config_path {
        match selection.config_source {
            SettingSource::Env => config_telemetry::log_env_source(path, true),
            SettingSource::Cli => config_telemetry::log_env_source(path, false),
            SettingSource::Default | SettingSource::Builtin => {}
        }
    }

    let config = LauncherConfig::load(selection.config_path.clone())
        .map_err(RuntimeExit::from_config_error)?;
    let profile = config
        .profile(&selection.profile)
        .map_err(RuntimeExit::from_config_error)?;
    let cwd = env::current_dir().map_err(RuntimeExit::from_error)?;
    let plan = LaunchPlan::prepare(&config, profile, &cwd);

    info!(
        target: "miner_launcher::runtime",
        "{}",
        build_summary(&selection, profile, &plan)
    );
    let config_path = selection
        .config_path
        .as_ref()
        .map(|path| path.to_string_lossy().to_string())
        .unwrap_or_default();
    emit_launch(&LaunchTelemetry {
        profile: &profile.name,
        config_path: &config_path,
        config_source: selection.config_source.as_str(),
        venv_active: plan.activation.active,
        working_dir: &plan.working_dir.to_string_lossy(),
        command_line: &plan.command_line(),
    });

    let exit = run_miner(&plan)
        .await
        .map_err(RuntimeExit::from_launch_error)?;
    Ok(ExitCode::from(exit.process_exit_code()))
}
