//! Telemetry initialization and miner launch span helpers.

use std::{io::IsTerminal, time::Instant};

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, info_span, warn, Span};
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

use crate::neuron::launch::MinerExit;

/// Initialize `tracing` and format developer logs.
///
/// Logs go to stderr so the miner's own output on stdout stays untouched.
pub fn init_tracing() -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}

/// Span helper to record start and finish of one miner launch.
pub struct LaunchSpan {
    span: Span,
    started_at: Instant,
    launch_id: Uuid,
}

impl LaunchSpan {
    /// Start a launch span.
    pub fn start(profile: &str) -> Self {
        let launch_id = Uuid::new_v4();
        let span = info_span!(
            target: "miner_launcher::launch",
            "miner_launch",
            %launch_id,
            profile
        );
        Self {
            span,
            started_at: Instant::now(),
            launch_id,
        }
    }

    /// Record a launch that never produced a child process.
    pub fn fail(&self, reason: &'static str) {
        let _entered = self.span.enter();
        warn!(
            target: "miner_launcher::launch",
            launch_id = %self.launch_id,
            reason = reason,
            elapsed_ms = self.started_at.elapsed().as_millis(),
            "Miner launch failed"
        );
    }

    /// Close the span while recording how the miner exited.
    pub fn finish(self, exit: &MinerExit) {
        let _entered = self.span.enter();
        info!(
            target: "miner_launcher::launch",
            launch_id = %self.launch_id,
            exit_code = exit.code,
            signal = exit.signal,
            elapsed_ms = self.started_at.elapsed().as_millis(),
            "Miner exited"
        );
    }
}

/// Payload for logging the resolved launch as structured telemetry.
#[derive(Debug, Serialize)]
pub struct LaunchTelemetry<'a> {
    pub profile: &'a str,
    pub config_path: &'a str,
    pub config_source: &'a str,
    pub venv_active: bool,
    pub working_dir: &'a str,
    pub command_line: &'a [String],
}

/// Emit the resolved launch to `tracing`.
pub fn emit_launch(telemetry: &LaunchTelemetry<'_>) {
    info!(
        target: "miner_launcher::runtime",
        profile = telemetry.profile,
        config_path = telemetry.config_path,
        config_source = telemetry.config_source,
        venv_active = telemetry.venv_active,
        working_dir = telemetry.working_dir,
        command_line = ?telemetry.command_line,
        started_at = %Utc::now().to_rfc3339(),
        "Resolved miner launch"
    );
}
