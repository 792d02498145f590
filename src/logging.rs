use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, LevelPadding, TermLogger, TerminalMode};

/// Pick the effective level: `--quiet` and `--verbose` beat the configured level.
pub fn level(quiet: bool, verbose: bool, configured: LevelFilter) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Warn,
        (false, true) => LevelFilter::Debug.max(configured),
        (false, false) => configured,
    }
}

/// Install the terminal logger on stdout, next to the output of the commands it describes.
/// Best-effort: a logger that is already installed is left in place.
pub fn init(level: LevelFilter) {
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .set_location_level(LevelFilter::Off)
        .set_level_padding(LevelPadding::Off)
        .build();
    let _ = TermLogger::init(level, config, TerminalMode::Stdout, ColorChoice::Auto);
}
