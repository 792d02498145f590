use std::fmt;

use crate::config::ShellConfig;
use crate::env::Environment;

/// Explicit shell choice, checked first.
pub const SHELL_OVERRIDE_VAR: &str = "GB_SHELL";
/// The user's login shell as exported by the OS.
pub const STD_SHELL_VAR: &str = "SHELL";

/// Host OS family, as far as default shell selection cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Unix,
    Windows,
}

impl HostOs {
    pub fn current() -> Self {
        if cfg!(windows) {
            HostOs::Windows
        } else {
            HostOs::Unix
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            HostOs::Unix => "unix",
            HostOs::Windows => "windows",
        }
    }
}

/// Which rule picked the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellSource {
    OverrideVar,
    StdVar,
    Default(HostOs),
}

impl fmt::Display for ShellSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellSource::OverrideVar => write!(f, "env {SHELL_OVERRIDE_VAR}"),
            ShellSource::StdVar => write!(f, "env {STD_SHELL_VAR}"),
            ShellSource::Default(os) => write!(f, "default {} shell", os.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSelection {
    pub source: ShellSource,
    pub shell: String,
}

/// Pick the shell: `GB_SHELL`, then `SHELL`, then the configured default for `os`.
/// Empty variables are treated as unset.
pub fn detect(env: &Environment, os: HostOs, defaults: &ShellConfig) -> ShellSelection {
    if let Some(shell) = env.get_non_empty(SHELL_OVERRIDE_VAR) {
        return ShellSelection {
            source: ShellSource::OverrideVar,
            shell: shell.to_string(),
        };
    }
    if let Some(shell) = env.get_non_empty(STD_SHELL_VAR) {
        return ShellSelection {
            source: ShellSource::StdVar,
            shell: shell.to_string(),
        };
    }
    let shell = match os {
        HostOs::Unix => &defaults.unix,
        HostOs::Windows => &defaults.windows,
    };
    ShellSelection {
        source: ShellSource::Default(os),
        shell: shell.clone(),
    }
}
