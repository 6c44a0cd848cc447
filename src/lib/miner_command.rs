//! Shared helpers for building the miner command.

use std::{path::Path, process::Stdio};

use tokio::process::Command;

use crate::{
    launcher::config::EnvVar, lib::venv::Activation, neuron::launch::LaunchConfiguration,
};

pub struct MinerCommandConfig<'a> {
    pub activation: &'a Activation,
    pub program: &'a Path,
    pub working_dir: &'a Path,
    pub vars: &'a [EnvVar],
}

/// Build the `<interpreter> <program> <flags…>` command with inherited stdio.
pub fn build_miner_command(
    config: MinerCommandConfig<'_>,
    launch: &LaunchConfiguration,
) -> Command {
    let mut command = Command::new(&config.activation.interpreter);
    command.kill_on_drop(true);
    command.current_dir(config.working_dir);
    for key in config.activation.removed_vars() {
        command.env_remove(key);
    }
    for (key, value) in config.activation.env_vars() {
        command.env(key, value);
    }
    for var in config.vars {
        command.env(&var.name, &var.value);
    }

    command.arg(config.program);
    command.args(launch.to_args());

    command
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    command
}

/// The full argv the miner is started with, for display and logging.
pub fn command_line(
    interpreter: &Path,
    program: &Path,
    launch: &LaunchConfiguration,
) -> Vec<String> {
    let mut line = vec![
        interpreter.display().to_string(),
        program.display().to_string(),
    ];
    line.extend(launch.to_args());
    line
}

/// Join argv into one line a POSIX shell would split back into the same tokens.
pub fn shell_join(args: &[String]) -> String {
    args.iter()
        .map(|arg| shell_quote(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,@+%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use std::{ffi::OsStr, path::PathBuf};

    use crate::launcher::config::builtin_profiles;

    use super::*;

    fn activation() -> Activation {
        Activation {
            active: true,
            virtual_env: Some(PathBuf::from("/srv/miner/venv")),
            path_var: Some("/srv/miner/venv/bin:/usr/bin".into()),
            interpreter: PathBuf::from("/srv/miner/venv/bin/python"),
        }
    }

    #[test]
    fn command_runs_program_then_profile_flags() {
        let launch = LaunchConfiguration::from_profile(&builtin_profiles()["start"]);
        let activation = activation();
        let vars = [EnvVar {
            name: "BT_AXON_TIMEOUT".into(),
            value: "30".into(),
        }];
        let command = build_miner_command(
            MinerCommandConfig {
                activation: &activation,
                program: Path::new("neurons/miner.py"),
                working_dir: Path::new("/srv/miner"),
                vars: &vars,
            },
            &launch,
        );
        let std_command = command.as_std();

        assert_eq!(
            std_command.get_program(),
            OsStr::new("/srv/miner/venv/bin/python")
        );
        let args: Vec<&OsStr> = std_command.get_args().collect();
        assert_eq!(args[0], OsStr::new("neurons/miner.py"));
        assert_eq!(args.len(), 1 + launch.to_args().len());
        assert_eq!(std_command.get_current_dir(), Some(Path::new("/srv/miner")));

        let envs: Vec<(&OsStr, Option<&OsStr>)> = std_command.get_envs().collect();
        assert!(envs.contains(&(OsStr::new("VIRTUAL_ENV"), Some(OsStr::new("/srv/miner/venv")))));
        assert!(envs.contains(&(OsStr::new("PYTHONHOME"), None)));
        assert!(envs.contains(&(OsStr::new("BT_AXON_TIMEOUT"), Some(OsStr::new("30")))));
    }

    #[test]
    fn shell_join_quotes_only_when_needed() {
        let args = vec![
            "python".to_string(),
            "--wallet.name".to_string(),
            "cold key".to_string(),
            "it's".to_string(),
        ];

        assert_eq!(
            shell_join(&args),
            r"python --wallet.name 'cold key' 'it'\''s'"
        );
    }
}
