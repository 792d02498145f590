//! Command lists and their sequential execution.
//!
//! A raw command variable is split on `;` into a [`CommandList`]. Lists run
//! strictly in order through an [`Executor`]; the first failure stops the list.

/// Spawning commands through the detected shell.
pub mod process;
/// Shell selection from environment and host OS.
pub mod shell;

pub use process::ShellExecutor;
pub use shell::{HostOs, ShellSelection, ShellSource};

use std::process::ExitStatus;

use thiserror::Error;

use crate::env::Environment;

/// Separator between commands in `GB` and `GB_RUN`.
pub const SEPARATOR: char = ';';

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("run '{command}' with {shell}: {source}")]
    Spawn {
        shell: String,
        command: String,
        source: std::io::Error,
    },
    #[error("command '{command}' failed: {status}")]
    Status { command: String, status: ExitStatus },
}

/// Which list a command belongs to. Only the run phase drops empty entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Build,
    Run,
}

impl Phase {
    /// Log verb for commands of this phase.
    pub fn verb(self) -> &'static str {
        match self {
            Phase::Build => "building",
            Phase::Run => "running",
        }
    }
}

/// Ordered, trimmed commands from one `;`-separated variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandList {
    phase: Phase,
    commands: Vec<String>,
}

impl CommandList {
    /// Split `raw` on `;` and trim each piece.
    ///
    /// Build lists keep empty pieces, so `"make;"` still runs an empty command
    /// after `make`. Run lists skip them.
    pub fn parse(phase: Phase, raw: &str) -> Self {
        let commands = raw
            .split(SEPARATOR)
            .map(str::trim)
            .filter(|cmd| phase == Phase::Build || !cmd.is_empty())
            .map(str::to_string)
            .collect();
        Self { phase, commands }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(String::as_str)
    }
}

/// Everything a command needs besides its own text.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub shell: &'a str,
    pub exec_flag: &'a str,
    pub env: &'a Environment,
}

/// Runs a single command string to completion.
pub trait Executor {
    fn execute(&self, command: &str, invocation: &Invocation<'_>) -> Result<(), ExecError>;
}

/// Run every command of `list` in order, stopping at the first failure.
pub fn run_all(
    list: &CommandList,
    executor: &dyn Executor,
    invocation: &Invocation<'_>,
) -> Result<(), ExecError> {
    list.iter().try_for_each(|command| {
        log::info!("{}: {command}", list.phase.verb());
        executor.execute(command, invocation)
    })
}
