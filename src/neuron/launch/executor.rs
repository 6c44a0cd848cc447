use std::{
    path::{Path, PathBuf},
    process::ExitStatus,
    time::Instant,
};

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    launcher::config::{EnvVar, LauncherConfig, MinerProfile},
    lib::{
        errors::LaunchError,
        miner_command::{self, MinerCommandConfig},
        telemetry::LaunchSpan,
        venv::{self, Activation},
    },
};

use super::LaunchConfiguration;

/// Everything needed to start the miner, resolved against the working directory.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub launch: LaunchConfiguration,
    pub working_dir: PathBuf,
    pub venv_dir: PathBuf,
    pub program: PathBuf,
    pub activation: Activation,
    pub vars: Vec<EnvVar>,
}

impl LaunchPlan {
    /// Resolve paths and activate the virtualenv for `profile`.
    pub fn prepare(config: &LauncherConfig, profile: &MinerProfile, cwd: &Path) -> Self {
        let environment = &config.environment;
        let working_dir = environment.resolve_working_dir(cwd);
        let venv_dir = environment.resolve_venv_dir(&working_dir);
        let activation = venv::activate(&venv_dir, &environment.interpreter);

        Self {
            launch: LaunchConfiguration::from_profile(profile),
            working_dir,
            venv_dir,
            program: environment.program.clone(),
            activation,
            vars: environment.vars.clone(),
        }
    }

    /// Program path resolved for existence checks.
    pub fn resolved_program(&self) -> PathBuf {
        if self.program.is_absolute() {
            self.program.clone()
        } else {
            self.working_dir.join(&self.program)
        }
    }

    pub fn command_line(&self) -> Vec<String> {
        miner_command::command_line(&self.activation.interpreter, &self.program, &self.launch)
    }
}

/// How the miner process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MinerExit {
    pub code: Option<i32>,
    pub signal: Option<i32>,
    pub elapsed_ms: u128,
}

impl MinerExit {
    fn from_status(status: ExitStatus, started_at: Instant) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
            elapsed_ms: started_at.elapsed().as_millis(),
        }
    }

    /// Exit code for the launcher: the child's code, or `128 + signal` like a shell.
    pub fn process_exit_code(&self) -> u8 {
        match (self.code, self.signal) {
            (Some(code), _) => (code & 0xff) as u8,
            (None, Some(signal)) => (128 + signal).clamp(0, 255) as u8,
            (None, None) => 1,
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Start the miner, wait for it, and report how it ended.
///
/// The launcher outlives `SIGINT` (the child gets the terminal's interrupt itself)
/// and forwards `SIGTERM` to the child.
pub async fn run_miner(plan: &LaunchPlan) -> Result<MinerExit, LaunchError> {
    if !plan.activation.active {
        warn!(
            target: "miner_launcher::launch",
            venv_dir = %plan.venv_dir.display(),
            interpreter = %plan.activation.interpreter.display(),
            "Virtualenv not found; starting the interpreter from PATH"
        );
    }

    let mut command = miner_command::build_miner_command(
        MinerCommandConfig {
            activation: &plan.activation,
            program: &plan.program,
            working_dir: &plan.working_dir,
            vars: &plan.vars,
        },
        &plan.launch,
    );

    let span = LaunchSpan::start(&plan.launch.profile);
    info!(
        target: "miner_launcher::launch",
        profile = %plan.launch.profile,
        working_dir = %plan.working_dir.display(),
        command = %miner_command::shell_join(&plan.command_line()),
        "Starting miner"
    );

    let started_at = Instant::now();
    let mut child = command.spawn().map_err(|source| {
        span.fail("spawn_failed");
        LaunchError::Spawn {
            program: plan.activation.interpreter.clone(),
            source,
        }
    })?;
    let pid = child.id();

    let mut interrupts = true;
    let mut terminate = terminate_signal();
    let status = loop {
        tokio::select! {
            status = child.wait() => {
                break status.map_err(|source| LaunchError::Wait {
                    program: plan.activation.interpreter.clone(),
                    source,
                })?;
            }
            _ = recv_interrupt(&mut interrupts) => {
                info!(
                    target: "miner_launcher::launch",
                    pid = pid,
                    "Interrupt received; waiting for the miner to exit"
                );
            }
            _ = recv_terminate(&mut terminate) => {
                forward_terminate(pid);
            }
        }
    };

    let exit = MinerExit::from_status(status, started_at);
    span.finish(&exit);
    Ok(exit)
}

async fn recv_interrupt(enabled: &mut bool) {
    if !*enabled {
        return std::future::pending::<()>().await;
    }
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(
            target: "miner_launcher::launch",
            error = %err,
            "Failed to listen for interrupts"
        );
        *enabled = false;
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
type TerminateSignal = Option<tokio::signal::unix::Signal>;
#[cfg(not(unix))]
type TerminateSignal = Option<()>;

#[cfg(unix)]
fn terminate_signal() -> TerminateSignal {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(stream) => Some(stream),
        Err(err) => {
            warn!(
                target: "miner_launcher::launch",
                error = %err,
                "Failed to listen for SIGTERM"
            );
            None
        }
    }
}

#[cfg(not(unix))]
fn terminate_signal() -> TerminateSignal {
    None
}

#[cfg(unix)]
async fn recv_terminate(signal: &mut TerminateSignal) {
    let closed = match signal.as_mut() {
        Some(stream) => stream.recv().await.is_none(),
        None => return std::future::pending::<()>().await,
    };
    if closed {
        *signal = None;
    }
}

#[cfg(not(unix))]
async fn recv_terminate(_signal: &mut TerminateSignal) {
    std::future::pending::<()>().await
}

#[cfg(unix)]
fn forward_terminate(pid: Option<u32>) {
    let Some(pid) = pid else {
        return;
    };
    info!(
        target: "miner_launcher::launch",
        pid = pid,
        "Forwarding SIGTERM to the miner"
    );
    let result = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if result != 0 {
        warn!(
            target: "miner_launcher::launch",
            pid = pid,
            error = %std::io::Error::last_os_error(),
            "Failed to forward SIGTERM"
        );
    }
}

#[cfg(not(unix))]
fn forward_terminate(_pid: Option<u32>) {}
