use std::process::{Command, Stdio};

use super::{ExecError, Executor, Invocation};

/// Runs each command as `<shell> <exec_flag> <command>` with inherited stdio.
///
/// The child gets exactly the invocation's environment, not the ambient one.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellExecutor;

impl Executor for ShellExecutor {
    fn execute(&self, command: &str, invocation: &Invocation<'_>) -> Result<(), ExecError> {
        let argv = [invocation.shell, invocation.exec_flag, command];
        log::debug!(
            "exec: {}",
            shlex::try_join(argv).unwrap_or_else(|_| argv.join(" "))
        );

        let status = Command::new(invocation.shell)
            .arg(invocation.exec_flag)
            .arg(command)
            .env_clear()
            .envs(invocation.env.vars_os())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| ExecError::Spawn {
                shell: invocation.shell.to_string(),
                command: command.to_string(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ExecError::Status {
                command: command.to_string(),
                status,
            })
        }
    }
}
