use std::path::Path;
use std::process::ExitCode;

use gb::cli::{self, Outcome};
use gb::config::Config;
use gb::env::Environment;
use gb::exec::{HostOs, ShellExecutor};
use gb::logging;
use gb::runner::{self, Options};

fn main() -> ExitCode {
    let cli = match cli::parse(std::env::args_os()) {
        Outcome::Run(cli) => cli,
        Outcome::Exit(code) => return ExitCode::from(code),
    };

    let config = Config::load();
    logging::init(logging::level(cli.quiet, cli.verbose, config.log_level()));

    let mut env = Environment::from_process();
    let options = Options {
        env_file: cli.env_file.as_deref(),
        // Relative to the working directory.
        dir: Path::new(""),
        os: HostOs::current(),
    };

    match runner::run(&config, &options, &mut env, &ShellExecutor) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("err: {e}");
            ExitCode::FAILURE
        }
    }
}
