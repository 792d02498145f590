//! The build-then-run sequence.

use std::path::Path;

use thiserror::Error;

use crate::config::Config;
use crate::env::Environment;
use crate::env::dotenv::{DotenvLoader, LoadError};
use crate::exec::{self, CommandList, ExecError, Executor, HostOs, Invocation, Phase};

/// Build commands, required.
pub const BUILD_VAR: &str = "GB";
/// Run commands, optional.
pub const RUN_VAR: &str = "GB_RUN";

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("env {0} is not set")]
    MissingBuildCommands(&'static str),
    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// Per-invocation inputs that don't come from the environment.
#[derive(Debug, Clone, Copy)]
pub struct Options<'a> {
    /// Positional env file name, if any.
    pub env_file: Option<&'a str>,
    /// Directory dotenv file names are resolved against.
    pub dir: &'a Path,
    pub os: HostOs,
}

/// Load dotenv files into `env`, then run the build commands and the run commands.
///
/// Every step aborts the sequence on failure. The environment is final before
/// the first command starts.
pub fn run(
    config: &Config,
    options: &Options<'_>,
    env: &mut Environment,
    executor: &dyn Executor,
) -> Result<(), Error> {
    let report = DotenvLoader::new(options.dir, config.dotenv.default_file.as_str())
        .load(env, options.env_file)?;
    if let Some(path) = &report.default_file {
        log::info!("using {}", path.display());
    }
    if let Some(path) = &report.override_file {
        log::info!("using dotenv file {}", path.display());
    }
    let env = &*env;

    let build = env
        .get_non_empty(BUILD_VAR)
        .ok_or(Error::MissingBuildCommands(BUILD_VAR))?;
    let run = env.get_non_empty(RUN_VAR);

    let selection = exec::shell::detect(env, options.os, &config.shell);
    log::info!("using shell {} (from {})", selection.shell, selection.source);
    log::info!("using build commands: {build}");
    if let Some(run) = run {
        log::info!("using run commands: {run}");
    }

    let invocation = Invocation {
        shell: &selection.shell,
        exec_flag: &config.shell.exec_flag,
        env,
    };

    exec::run_all(&CommandList::parse(Phase::Build, build), executor, &invocation)?;
    if let Some(run) = run {
        exec::run_all(&CommandList::parse(Phase::Run, run), executor, &invocation)?;
    }
    Ok(())
}
