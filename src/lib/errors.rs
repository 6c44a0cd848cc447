use std::{io, path::PathBuf};

use config::ConfigError as ConfigLoaderError;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur while loading or validating the launcher configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The `config` loader rejected the file contents.
    #[error("Failed to load configuration file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Failed to deserialize TOML into a struct.
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// An explicitly requested configuration file does not exist.
    #[error("Configuration file {path} does not exist")]
    NotFound { path: PathBuf },
    /// Required field is missing.
    #[error("Configuration file {path} is missing `{field}`")]
    MissingField { path: PathBuf, field: String },
    /// Field failed validation.
    #[error("Configuration file {path} has invalid `{field}`: {message}")]
    InvalidField {
        path: PathBuf,
        field: String,
        message: String,
    },
    /// The selected launch profile is not defined.
    #[error("Unknown launch profile `{name}` (available: {})", .available.join(", "))]
    UnknownProfile {
        name: String,
        available: Vec<String>,
    },
}

impl ConfigError {
    /// Helper to wrap `config::ConfigError` as a read failure.
    pub fn from_read_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::FileRead { path, source }
    }

    /// Helper to wrap `config::ConfigError` as a parse failure.
    pub fn from_parse_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::Parse { path, source }
    }

    pub fn missing(path: &std::path::Path, field: impl Into<String>) -> Self {
        Self::MissingField {
            path: path.to_path_buf(),
            field: field.into(),
        }
    }

    pub fn invalid(
        path: &std::path::Path,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            path: path.to_path_buf(),
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failures while starting or waiting for the miner process.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Failed to start `{program}`: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed while waiting for `{program}`: {source}")]
    Wait {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LaunchError {
    /// Exit code a POSIX shell reports for the same failure.
    ///
    /// 127 when the interpreter cannot be found, 126 when it cannot be executed.
    pub fn shell_exit_code(&self) -> u8 {
        match self {
            LaunchError::Spawn { source, .. } => match source.kind() {
                io::ErrorKind::NotFound => 127,
                io::ErrorKind::PermissionDenied => 126,
                _ => 1,
            },
            LaunchError::Wait { .. } => 1,
        }
    }

    pub fn descriptor(&self) -> &'static ErrorDescriptor {
        match self {
            LaunchError::Spawn { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                &INTERPRETER_NOT_FOUND
            }
            LaunchError::Spawn { source, .. }
                if source.kind() == io::ErrorKind::PermissionDenied =>
            {
                &INTERPRETER_NOT_EXECUTABLE
            }
            LaunchError::Spawn { .. } => &SPAWN_FAILED,
            LaunchError::Wait { .. } => &WAIT_FAILED,
        }
    }
}

/// Failures of the read-only preflight checks.
#[derive(Debug, Error)]
pub enum PreflightError {
    #[error("I/O failed for file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("File {path} is not valid JSON: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Structured error metadata printed on stderr when the launcher itself fails.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDescriptor {
    /// Error code.
    pub code: &'static str,
    /// User-facing message.
    pub message: &'static str,
    /// Recommended remediation.
    pub remediation: &'static str,
}

pub static CONFIG_INVALID: ErrorDescriptor = ErrorDescriptor::new(
    "config_invalid",
    "The launcher configuration could not be loaded",
    "Fix the reported field in launcher.toml or run `miner-launcher init` for a sample.",
);
pub static INTERPRETER_NOT_FOUND: ErrorDescriptor = ErrorDescriptor::new(
    "interpreter_not_found",
    "The interpreter for the miner could not be found",
    "Create the virtualenv (environment.venv_dir) or put the interpreter on PATH.",
);
pub static INTERPRETER_NOT_EXECUTABLE: ErrorDescriptor = ErrorDescriptor::new(
    "interpreter_not_executable",
    "The interpreter for the miner is not executable",
    "Check the permissions of the interpreter inside the virtualenv.",
);
pub static SPAWN_FAILED: ErrorDescriptor = ErrorDescriptor::new(
    "spawn_failed",
    "The miner process could not be started",
    "Run `miner-launcher check` to inspect the environment.",
);
pub static WAIT_FAILED: ErrorDescriptor = ErrorDescriptor::new(
    "wait_failed",
    "Lost track of the miner process",
    "Inspect the miner logs; the process may still be running.",
);

impl ErrorDescriptor {
    /// Simple constructor.
    pub const fn new(code: &'static str, message: &'static str, remediation: &'static str) -> Self {
        Self {
            code,
            message,
            remediation,
        }
    }

    /// Render the descriptor plus details as a JSON object.
    pub fn to_value(&self, details: Value) -> Value {
        let mut map = Map::new();
        map.insert("code".into(), Value::from(self.code));
        map.insert("message".into(), Value::from(self.message));
        map.insert("remediation".into(), Value::from(self.remediation));
        map.insert("details".into(), details);
        Value::Object(map)
    }
}
