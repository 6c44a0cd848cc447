//! Virtualenv activation expressed as the environment handed to the child process.

use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
};

/// Name of the executables directory inside a virtualenv.
#[cfg(windows)]
pub const VENV_BIN_DIR: &str = "Scripts";
#[cfg(not(windows))]
pub const VENV_BIN_DIR: &str = "bin";

/// Result of activating (or failing to activate) a virtualenv.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    /// Whether the virtualenv directory was found.
    pub active: bool,
    /// Value for `VIRTUAL_ENV` when active.
    pub virtual_env: Option<PathBuf>,
    /// Value for `PATH` seen by the child.
    pub path_var: Option<OsString>,
    /// Interpreter to spawn: inside the virtualenv when present, else the bare name.
    pub interpreter: PathBuf,
}

impl Activation {
    /// Variables `activate` would set, in the order they are applied.
    pub fn env_vars(&self) -> Vec<(&'static str, OsString)> {
        let mut vars = Vec::new();
        if let Some(virtual_env) = &self.virtual_env {
            vars.push(("VIRTUAL_ENV", virtual_env.clone().into_os_string()));
        }
        if let Some(path_var) = &self.path_var {
            vars.push(("PATH", path_var.clone()));
        }
        vars
    }

    /// Variables `activate` unsets.
    pub fn removed_vars(&self) -> &'static [&'static str] {
        if self.active {
            &["PYTHONHOME"]
        } else {
            &[]
        }
    }
}

/// Activate `venv_dir` using the launcher's current `PATH`.
pub fn activate(venv_dir: &Path, interpreter: &str) -> Activation {
    activate_with_path(venv_dir, interpreter, env::var_os("PATH"))
}

/// Activate `venv_dir` on top of an explicit `PATH` value.
///
/// A missing virtualenv is not an error: the interpreter is left to `PATH` lookup.
pub fn activate_with_path(
    venv_dir: &Path,
    interpreter: &str,
    current_path: Option<OsString>,
) -> Activation {
    let bin_dir = venv_dir.join(VENV_BIN_DIR);
    if !bin_dir.is_dir() {
        return Activation {
            active: false,
            virtual_env: None,
            path_var: current_path,
            interpreter: PathBuf::from(interpreter),
        };
    }

    let mut entries = vec![bin_dir.clone()];
    if let Some(existing) = current_path.as_ref() {
        entries.extend(env::split_paths(existing));
    }
    let path_var = env::join_paths(entries).ok().or(current_path);

    let candidate = bin_dir.join(interpreter);
    let interpreter = if candidate.exists() {
        candidate
    } else {
        PathBuf::from(interpreter)
    };

    Activation {
        active: true,
        virtual_env: Some(venv_dir.to_path_buf()),
        path_var,
        interpreter,
    }
}

/// Look `name` up on a `PATH` value the way a shell would.
pub fn find_on_path(name: &str, path_var: Option<&OsString>) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    path_var.and_then(|paths| {
        env::split_paths(paths)
            .map(|dir| dir.join(name))
            .find(|path| path.is_file())
    })
}
