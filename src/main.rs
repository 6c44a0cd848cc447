//! Entry point for the miner launcher.
use std::process::ExitCode;

use clap::{error::ErrorKind, Parser};
use miner_launcher::{
    cli::{dry_run_line, execute_cli_command, CliCommand, LaunchArgs, LaunchSelection, ParsedCommand},
    launcher::runtime::{self, RuntimeExit},
    lib::telemetry,
};

#[tokio::main]
async fn main() -> ExitCode {
    match bootstrap().await {
        Ok(code) => code,
        Err(exit) => exit.report(),
    }
}

async fn bootstrap() -> Result<ExitCode, RuntimeExit> {
    telemetry::init_tracing().map_err(RuntimeExit::from_error)?;
    let args = parse_args()?;
    let command = args.into_command().map_err(RuntimeExit::from_error)?;

    match command {
        ParsedCommand::Launch {
            selection,
            dry_run: true,
        } => {
            let line = dry_run_line(&selection).map_err(RuntimeExit::from_cli_error)?;
            println!("{line}");
            Ok(ExitCode::SUCCESS)
        }
        ParsedCommand::Launch { selection, .. } => runtime::run_launch(selection).await,
        ParsedCommand::Cli(command, selection) => handle_cli_command(command, &selection),
    }
}

/// `--help` and `--version` exit through clap; usage errors become a `RuntimeExit`.
fn parse_args() -> Result<LaunchArgs, RuntimeExit> {
    LaunchArgs::try_parse().or_else(|err| match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => err.exit(),
        _ => Err(RuntimeExit::from_usage_error(err)),
    })
}

fn handle_cli_command(
    command: CliCommand,
    selection: &LaunchSelection,
) -> Result<ExitCode, RuntimeExit> {
    let output =
        execute_cli_command(command, selection).map_err(RuntimeExit::from_cli_error)?;
    println!("{}", output.payload);
    Ok(if output.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
