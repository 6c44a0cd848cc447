//! Read-only environment checks run by `miner-launcher check`.
//!
//! A launch never runs these: the miner is started even when they would fail.

use std::{
    io,
    net::{Ipv4Addr, TcpListener},
    path::Path,
};

use serde::Serialize;
use tracing::debug;

use crate::{
    launcher::config::MinerProfile,
    lib::{fs as launcher_fs, venv},
    neuron::launch::LaunchPlan,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Ok,
    Warning,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreflightCheck {
    pub name: &'static str,
    pub status: CheckStatus,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl PreflightCheck {
    fn new(name: &'static str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name,
            status,
            detail: detail.into(),
            sha256: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PreflightReport {
    pub profile: String,
    pub checks: Vec<PreflightCheck>,
}

impl PreflightReport {
    pub fn passed(&self) -> bool {
        self.checks
            .iter()
            .all(|check| check.status != CheckStatus::Failed)
    }

    pub fn check(&self, name: &str) -> Option<&PreflightCheck> {
        self.checks.iter().find(|check| check.name == name)
    }
}

/// Inspect the environment `plan` would launch into.
pub fn run_preflight(plan: &LaunchPlan, profile: &MinerProfile) -> PreflightReport {
    let checks = vec![
        check_virtualenv(plan),
        check_interpreter(plan),
        check_program(plan),
        check_scraping_config(plan, profile),
        check_axon_port(profile.axon_port),
    ];
    for check in &checks {
        debug!(
            target: "miner_launcher::launch",
            check = check.name,
            status = ?check.status,
            detail = %check.detail,
            "Preflight check finished"
        );
    }

    PreflightReport {
        profile: profile.name.clone(),
        checks,
    }
}

fn check_virtualenv(plan: &LaunchPlan) -> PreflightCheck {
    if plan.activation.active {
        PreflightCheck::new(
            "virtualenv",
            CheckStatus::Ok,
            plan.venv_dir.display().to_string(),
        )
    } else {
        PreflightCheck::new(
            "virtualenv",
            CheckStatus::Warning,
            format!(
                "{} not found; the interpreter will be taken from PATH",
                plan.venv_dir.display()
            ),
        )
    }
}

fn check_interpreter(plan: &LaunchPlan) -> PreflightCheck {
    let interpreter = &plan.activation.interpreter;
    let resolved = if interpreter.components().count() > 1 {
        interpreter.is_file().then(|| interpreter.clone())
    } else {
        venv::find_on_path(
            &interpreter.to_string_lossy(),
            plan.activation.path_var.as_ref(),
        )
    };

    match resolved {
        Some(path) => PreflightCheck::new("interpreter", CheckStatus::Ok, path.display().to_string()),
        None => PreflightCheck::new(
            "interpreter",
            CheckStatus::Failed,
            format!("{} could not be found", interpreter.display()),
        ),
    }
}

fn check_program(plan: &LaunchPlan) -> PreflightCheck {
    let program = plan.resolved_program();
    if program.is_file() {
        PreflightCheck::new("program", CheckStatus::Ok, program.display().to_string())
    } else {
        PreflightCheck::new(
            "program",
            CheckStatus::Failed,
            format!("{} does not exist", program.display()),
        )
    }
}

fn check_scraping_config(plan: &LaunchPlan, profile: &MinerProfile) -> PreflightCheck {
    let path = if profile.scraping_config_file.is_absolute() {
        profile.scraping_config_file.clone()
    } else {
        plan.working_dir.join(&profile.scraping_config_file)
    };
    inspect_json_file("scraping_config", &path)
}

fn inspect_json_file(name: &'static str, path: &Path) -> PreflightCheck {
    if !path.is_file() {
        return PreflightCheck::new(
            name,
            CheckStatus::Failed,
            format!("{} does not exist", path.display()),
        );
    }
    if let Err(err) = launcher_fs::read_json(path) {
        return PreflightCheck::new(name, CheckStatus::Failed, err.to_string());
    }
    match launcher_fs::compute_sha256(path) {
        Ok(digest) => PreflightCheck {
            sha256: Some(digest),
            ..PreflightCheck::new(name, CheckStatus::Ok, path.display().to_string())
        },
        Err(err) => PreflightCheck::new(name, CheckStatus::Failed, err.to_string()),
    }
}

fn check_axon_port(port: u16) -> PreflightCheck {
    match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)) {
        Ok(_) => PreflightCheck::new("axon_port", CheckStatus::Ok, format!("{port} is free")),
        Err(err) if err.kind() == io::ErrorKind::AddrInUse => PreflightCheck::new(
            "axon_port",
            CheckStatus::Failed,
            format!("{port} is already in use"),
        ),
        Err(err) => PreflightCheck::new(
            "axon_port",
            CheckStatus::Warning,
            format!("could not probe {port}: {err}"),
        ),
    }
}
