use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::lib::errors::ConfigError;

pub const DEFAULT_VENV_DIR: &str = "venv";
pub const DEFAULT_INTERPRETER: &str = "python";
pub const DEFAULT_PROGRAM: &str = "neurons/miner.py";

/// Runtime environment the miner is started in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSection {
    pub venv_dir: PathBuf,
    pub interpreter: String,
    pub program: PathBuf,
    pub working_dir: Option<PathBuf>,
    pub vars: Vec<EnvVar>,
}

impl Default for EnvironmentSection {
    fn default() -> Self {
        Self {
            venv_dir: PathBuf::from(DEFAULT_VENV_DIR),
            interpreter: DEFAULT_INTERPRETER.to_string(),
            program: PathBuf::from(DEFAULT_PROGRAM),
            working_dir: None,
            vars: Vec::new(),
        }
    }
}

impl EnvironmentSection {
    /// Directory the miner runs in; relative paths below are resolved against it.
    pub fn resolve_working_dir(&self, cwd: &Path) -> PathBuf {
        match &self.working_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => cwd.join(dir),
            None => cwd.to_path_buf(),
        }
    }

    pub fn resolve_venv_dir(&self, working_dir: &Path) -> PathBuf {
        resolve_against(working_dir, &self.venv_dir)
    }

    pub fn resolve_program(&self, working_dir: &Path) -> PathBuf {
        resolve_against(working_dir, &self.program)
    }
}

/// Extra variable exported to the miner process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawEnvironmentSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venv_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvVar>>,
}

pub fn parse_environment_section(
    raw: Option<RawEnvironmentSection>,
    path: &Path,
) -> Result<EnvironmentSection, ConfigError> {
    let raw = raw.unwrap_or_default();
    let defaults = EnvironmentSection::default();

    let venv_dir = raw.venv_dir.unwrap_or(defaults.venv_dir);
    if venv_dir.as_os_str().is_empty() {
        return Err(ConfigError::invalid(
            path,
            "environment.venv_dir",
            "Provide the virtualenv directory",
        ));
    }

    let interpreter = raw.interpreter.unwrap_or(defaults.interpreter);
    if interpreter.trim().is_empty() || interpreter.chars().any(char::is_whitespace) {
        return Err(ConfigError::invalid(
            path,
            "environment.interpreter",
            "Provide an interpreter name or path without whitespace",
        ));
    }

    let program = raw.program.unwrap_or(defaults.program);
    if program.as_os_str().is_empty() {
        return Err(ConfigError::invalid(
            path,
            "environment.program",
            "Provide the path of the miner entry point",
        ));
    }

    let vars = raw.env.unwrap_or_default();
    validate_vars(&vars, path)?;

    Ok(EnvironmentSection {
        venv_dir,
        interpreter,
        program,
        working_dir: raw.working_dir,
        vars,
    })
}

fn validate_vars(vars: &[EnvVar], path: &Path) -> Result<(), ConfigError> {
    for var in vars {
        if var.name.is_empty() || var.name.contains('=') || var.name.contains('\0') {
            return Err(ConfigError::invalid(
                path,
                "environment.env",
                format!("Invalid variable name `{}`", var.name),
            ));
        }
    }
    Ok(())
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
