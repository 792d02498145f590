use log::LevelFilter;
use serde::Deserialize;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// User overlay location, relative to `$HOME`.
const USER_CONFIG: &str = ".config/gb/config.toml";

// ── Final (merged) config types ──

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub dotenv: DotenvConfig,
    #[serde(default)]
    pub shell: ShellConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct Settings {
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    #[serde(default)]
    pub log_level: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct DotenvConfig {
    /// File read on every run without overriding inherited variables.
    #[serde(default)]
    pub default_file: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ShellConfig {
    /// Fallback shell on unix-like hosts.
    #[serde(default)]
    pub unix: String,
    /// Fallback shell on Windows.
    #[serde(default)]
    pub windows: String,
    /// Flag that makes the shell execute its next argument as a command string.
    #[serde(default)]
    pub exec_flag: String,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    dotenv: DotenvOverlay,
    #[serde(default)]
    shell: ShellOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    log_level: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct DotenvOverlay {
    default_file: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ShellOverlay {
    unix: Option<String>,
    windows: Option<String>,
    exec_flag: Option<String>,
}

/// Replace `target` with a non-empty overlay value.
fn merge_scalar(target: &mut String, value: Option<String>) {
    if let Some(v) = value.filter(|v| !v.is_empty()) {
        *target = v;
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge user overlay from ~/.config/gb/config.toml (if exists)
    ///
    /// Every overlay value is a scalar that replaces the default. Empty strings
    /// are ignored so a section can't blank out a required setting.
    pub fn load() -> Self {
        let mut config = Self::default_config();
        if let Some(overlay) = Self::load_overlay() {
            config.apply_overlay(overlay);
        }
        config
    }

    /// Try to load user overlay from ~/.config/gb/config.toml.
    fn load_overlay() -> Option<ConfigOverlay> {
        let home = std::env::var_os("HOME")?;
        let path = std::path::Path::new(&home).join(USER_CONFIG);
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                eprintln!("gb: config parse error: {e}");
                None
            }
        }
    }

    /// Apply an overlay on top of this config.
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        merge_scalar(&mut self.settings.log_level, overlay.settings.log_level);
        merge_scalar(&mut self.dotenv.default_file, overlay.dotenv.default_file);

        let s = overlay.shell;
        merge_scalar(&mut self.shell.unix, s.unix);
        merge_scalar(&mut self.shell.windows, s.windows);
        merge_scalar(&mut self.shell.exec_flag, s.exec_flag);
    }

    /// Configured log level; unknown names fall back to `info`.
    pub fn log_level(&self) -> LevelFilter {
        self.settings.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}
