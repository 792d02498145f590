//! gb: a minimal build runner.
//!
//! Build and run commands come from the `GB` and `GB_RUN` environment
//! variables, optionally seeded from dotenv files. Each `;`-separated command
//! is executed in order through the detected shell; the first failure stops
//! everything.
//!
//! # Architecture
//!
//! - **[`env`]**: Explicit environment object and layered dotenv loading.
//! - **[`exec`]**: Command lists, shell detection, sequential execution.
//! - **[`runner`]**: The load, detect, build, run sequence.
//! - **[`cli`]**: Argument parsing and exit-code mapping.
//! - **[`config`]**: Configuration loading: embedded defaults + user overlay merge.
//! - **[`logging`]**: Terminal logger setup.

/// Command-line arguments.
pub mod cli;
/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Environment object and dotenv files.
pub mod env;
/// Command splitting, shell selection and process execution.
pub mod exec;
/// Terminal logging on stdout.
pub mod logging;
/// Orchestration of a full gb invocation.
pub mod runner;
