//! Environment handed explicitly through loading, shell detection and execution.
//!
//! The process environment is captured once at startup into an [`Environment`],
//! mutated by the dotenv loader, and passed whole to every spawned command.

/// Dotenv file parsing and layered loading.
pub mod dotenv;

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

use thiserror::Error;

/// Rejected environment writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    #[error("setenv: empty variable name")]
    EmptyKey,
    #[error("setenv: invalid variable name {0:?}")]
    InvalidKey(String),
    #[error("setenv: invalid value for {0}")]
    InvalidValue(String),
}

/// Variable name to value mapping used in place of the ambient process environment.
///
/// Inherited variables that aren't valid UTF-8 can't be read or written through
/// the `&str` API, but they still count as present and are passed on to children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
    opaque: BTreeMap<OsString, OsString>,
}

impl Environment {
    /// An empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current process environment.
    pub fn from_process() -> Self {
        Self::from_os_vars(std::env::vars_os())
    }

    /// Build from raw OS pairs, keeping non-UTF-8 entries opaque.
    pub fn from_os_vars<I: IntoIterator<Item = (OsString, OsString)>>(vars: I) -> Self {
        let mut env = Self::new();
        for (key, value) in vars {
            match (key.to_str(), value.to_str()) {
                (Some(k), Some(v)) => {
                    env.vars.insert(k.to_string(), v.to_string());
                }
                _ => {
                    env.opaque.insert(key, value);
                }
            }
        }
        if !env.opaque.is_empty() {
            log::debug!(
                "{} non-UTF-8 environment variables passed through unread",
                env.opaque.len()
            );
        }
        env
    }

    /// Value of `key`. Non-UTF-8 values read as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Like [`get`](Self::get), but an empty value counts as unset.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key) || self.opaque.contains_key(OsStr::new(key))
    }

    /// Set `key`, replacing any existing value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), EnvError> {
        validate(key, value)?;
        self.opaque.remove(OsStr::new(key));
        self.vars.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Set `key` only when it is not present yet. Returns whether the value was written.
    pub fn set_default(&mut self, key: &str, value: &str) -> Result<bool, EnvError> {
        if self.contains(key) {
            return Ok(false);
        }
        self.set(key, value)?;
        Ok(true)
    }

    /// Every variable as OS strings, the way a child process receives them.
    pub fn vars_os(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars
            .iter()
            .map(|(k, v)| (OsStr::new(k), OsStr::new(v)))
            .chain(self.opaque.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str())))
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.vars.is_empty() && self.opaque.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            opaque: BTreeMap::new(),
        }
    }
}

/// Same restrictions the OS applies to `setenv`.
fn validate(key: &str, value: &str) -> Result<(), EnvError> {
    if key.is_empty() {
        return Err(EnvError::EmptyKey);
    }
    if key.contains(['=', '\0']) {
        return Err(EnvError::InvalidKey(key.to_string()));
    }
    if value.contains('\0') {
        return Err(EnvError::InvalidValue(key.to_string()));
    }
    Ok(())
}
