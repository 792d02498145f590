use std::ffi::OsString;

use clap::Parser;
use clap::error::{ContextKind, ContextValue, ErrorKind};

/// Printed when more than one env file is given.
pub const TOO_MANY_FILES: &str = "error: only one env file can be specified, refer to 'gb -h'";

const AFTER_HELP: &str = "\
Environment variables:
  GB        build commands (required)
  GB_RUN    run commands, executed after every build command succeeded
  GB_SHELL  shell used to execute commands (default: $SHELL, then bash / powershell.exe)

GB and GB_RUN may hold several commands separated by ';'.
Each command is passed to the shell separately, as `<shell> -c <command>`.

Env files:
  .env is always read when present. It never overrides variables passed to gb.
  ENV_FILE overrides existing variables and is read as <name>, .<name>.gb or
  .<name>.env, whichever is readable first.

Priority of sources:
  1) ENV_FILE
  2) variables inherited by gb
  3) .env";

/// gb is a simple build runner, taking commands from environment variables and .env / .gb files.
#[derive(Parser, Debug)]
#[command(name = "gb", version, after_help = AFTER_HELP)]
pub struct Cli {
    /// Additional env file: <name>, .<name>.gb or .<name>.env
    #[arg(value_name = "ENV_FILE")]
    pub env_file: Option<String>,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log debug details, including the exact shell invocation
    #[arg(short, long)]
    pub verbose: bool,
}

/// Result of argument parsing: either go ahead, or exit with a status code.
#[derive(Debug)]
pub enum Outcome {
    Run(Cli),
    Exit(u8),
}

/// Parse arguments. Help and version exit 0; every usage error exits 1.
pub fn parse<I, T>(args: I) -> Outcome
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Outcome::Run(cli),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = err.print();
                Outcome::Exit(0)
            }
            _ if is_extra_positional(&err) => {
                println!("{TOO_MANY_FILES}");
                Outcome::Exit(1)
            }
            _ => {
                let _ = err.print();
                Outcome::Exit(1)
            }
        },
    }
}

/// clap reports a second positional as an unexpected argument that isn't a flag.
fn is_extra_positional(err: &clap::Error) -> bool {
    if err.kind() != ErrorKind::UnknownArgument {
        return false;
    }
    match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(arg)) => !arg.starts_with('-'),
        _ => false,
    }
}
