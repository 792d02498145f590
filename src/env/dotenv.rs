//! Dotenv files: `KEY=VALUE` lines, `#` and `//` comments, blank lines ignored.
//!
//! Loading is layered. The default file (`.env`) only fills in variables that
//! are not set yet; an explicitly requested file overrides everything.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{EnvError, Environment};

/// One `KEY=VALUE` line. Key and value are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub key: String,
    pub value: String,
    /// 1-based line number in the source file.
    pub line: usize,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("incorrect env line #{line}: '{content}' cannot be parsed as env format KEY=VALUE")]
    Malformed { line: usize, content: String },
    #[error("read line #{line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },
}

/// Failure reading or applying a single dotenv file.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("open {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("{}: {source}", .path.display())]
    Parse { path: PathBuf, source: ParseError },
    #[error("{}: line #{line}: {source}", .path.display())]
    Env {
        path: PathBuf,
        line: usize,
        source: EnvError,
    },
}

impl FileError {
    pub fn path(&self) -> &Path {
        match self {
            FileError::Open { path, .. }
            | FileError::Parse { path, .. }
            | FileError::Env { path, .. } => path,
        }
    }

    /// True when the file simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FileError::Open { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("load {source}")]
    Default { source: FileError },
    #[error(
        "load dotenv file {name}: {}",
        .failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    )]
    NoCandidate {
        name: String,
        failures: Vec<FileError>,
    },
}

/// How assignments interact with variables that are already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Only set variables that are absent.
    KeepExisting,
    /// Always overwrite.
    Override,
}

/// Files applied by a successful [`DotenvLoader::load`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// The default file, when it existed.
    pub default_file: Option<PathBuf>,
    /// The override candidate that was used, if a name was given.
    pub override_file: Option<PathBuf>,
}

/// Parse dotenv content.
///
/// Lines are trimmed; blank lines and lines starting with `#` or `//` are
/// skipped. Everything else must contain `=`, and is split on the first one.
pub fn parse<R: BufRead>(reader: R) -> Result<Vec<Assignment>, ParseError> {
    let mut assignments = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let number = idx + 1;
        let line = line.map_err(|source| ParseError::Read {
            line: number,
            source,
        })?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(ParseError::Malformed {
                line: number,
                content: line.to_string(),
            });
        };
        assignments.push(Assignment {
            key: key.to_string(),
            value: value.to_string(),
            line: number,
        });
    }
    Ok(assignments)
}

/// Read `path` and apply its assignments to `env`.
///
/// The whole file is parsed before anything is written, so a malformed file
/// leaves `env` untouched. Returns the number of variables written.
pub fn apply_file(env: &mut Environment, path: &Path, mode: Mode) -> Result<usize, FileError> {
    let file = File::open(path).map_err(|source| FileError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let assignments = parse(BufReader::new(file)).map_err(|source| FileError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let mut written = 0;
    for a in &assignments {
        let result = match mode {
            Mode::Override => env.set(&a.key, &a.value).map(|()| true),
            Mode::KeepExisting => env.set_default(&a.key, &a.value),
        };
        match result {
            Ok(true) => written += 1,
            Ok(false) => log::trace!("{}: keeping existing {}", path.display(), a.key),
            Err(source) => {
                return Err(FileError::Env {
                    path: path.to_path_buf(),
                    line: a.line,
                    source,
                });
            }
        }
    }
    Ok(written)
}

/// File names tried, in order, for an explicitly requested env file `name`.
pub fn candidates(name: &str) -> [String; 3] {
    [name.to_string(), format!(".{name}.gb"), format!(".{name}.env")]
}

/// Resolves and applies the default and override dotenv files relative to a directory.
#[derive(Debug, Clone)]
pub struct DotenvLoader {
    dir: PathBuf,
    default_file: String,
}

impl DotenvLoader {
    pub fn new(dir: impl Into<PathBuf>, default_file: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            default_file: default_file.into(),
        }
    }

    /// Load the default file, then the override file for `name` if given.
    ///
    /// A missing default file is ignored; any other failure on it aborts.
    /// Override candidates are tried in [`candidates`] order and the first one
    /// that reads cleanly wins. When none does, every failure is reported.
    pub fn load(&self, env: &mut Environment, name: Option<&str>) -> Result<LoadReport, LoadError> {
        let mut report = LoadReport::default();

        let default_path = self.dir.join(&self.default_file);
        match apply_file(env, &default_path, Mode::KeepExisting) {
            Ok(written) => {
                log::debug!("{}: {written} new variables", default_path.display());
                report.default_file = Some(default_path);
            }
            Err(e) if e.is_not_found() => {
                log::debug!("no {} found", default_path.display());
            }
            Err(source) => return Err(LoadError::Default { source }),
        }

        let Some(name) = name else {
            return Ok(report);
        };

        let mut failures = Vec::with_capacity(3);
        for (idx, candidate) in candidates(name).iter().enumerate() {
            // Only the name as given is a user path; the dotted forms are local files.
            let file = if idx == 0 {
                expand_home(candidate, env)
            } else {
                candidate.clone()
            };
            let path = self.dir.join(file);
            match apply_file(env, &path, Mode::Override) {
                Ok(written) => {
                    log::debug!("{}: {written} variables", path.display());
                    report.override_file = Some(path);
                    return Ok(report);
                }
                Err(e) => {
                    log::debug!("skipping dotenv candidate: {e}");
                    failures.push(e);
                }
            }
        }

        Err(LoadError::NoCandidate {
            name: name.to_string(),
            failures,
        })
    }
}

fn expand_home(file: &str, env: &Environment) -> String {
    shellexpand::tilde_with_context(file, || {
        env.get_non_empty("HOME")
            .or_else(|| env.get_non_empty("USERPROFILE"))
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn parse_str(s: &str) -> Result<Vec<Assignment>, ParseError> {
        parse(s.as_bytes())
    }

    fn kv(assignments: &[Assignment]) -> Vec<(&str, &str)> {
        assignments
            .iter()
            .map(|a| (a.key.as_str(), a.value.as_str()))
            .collect()
    }

    // ── Parsing ──

    #[test]
    fn splits_on_first_equals_only() {
        let parsed = parse_str("URL=postgres://u:p@h/db?a=b\n").unwrap();
        assert_eq!(kv(&parsed), vec![("URL", "postgres://u:p@h/db?a=b")]);
    }

    #[test]
    fn key_and_value_are_verbatim() {
        let parsed = parse_str("  A = \"quoted value\"  \nB=\nC='x'").unwrap();
        assert_eq!(
            kv(&parsed),
            vec![("A ", " \"quoted value\""), ("B", ""), ("C", "'x'")]
        );
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        let parsed = parse_str("\n# comment\n   // also comment\n\t\nA=1\n#B=2\n").unwrap();
        assert_eq!(kv(&parsed), vec![("A", "1")]);
        assert_eq!(parsed[0].line, 5);
    }

    #[test]
    fn missing_equals_reports_line_and_content() {
        let err = parse_str("A=1\n\n# x\n  NOVALUE  \nB=2").unwrap_err();
        match &err {
            ParseError::Malformed { line, content } => {
                assert_eq!(*line, 4);
                assert_eq!(content, "NOVALUE");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "incorrect env line #4: 'NOVALUE' cannot be parsed as env format KEY=VALUE"
        );
    }

    #[test]
    fn crlf_lines() {
        let parsed = parse_str("A=1\r\nB=2\r\n").unwrap();
        assert_eq!(kv(&parsed), vec![("A", "1"), ("B", "2")]);
    }

    #[test]
    fn invalid_utf8_is_read_error() {
        let err = parse(&b"A=1\nB=\xff\xfe\n"[..]).unwrap_err();
        assert!(matches!(err, ParseError::Read { line: 2, .. }), "{err:?}");
    }

    // ── Applying files ──

    #[test]
    fn keep_existing_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "A=file\nB=file\n").unwrap();

        let mut env: Environment = [("A", "process")].into_iter().collect();
        let written = apply_file(&mut env, &path, Mode::KeepExisting).unwrap();
        assert_eq!(written, 1);
        assert_eq!(env.get("A"), Some("process"));
        assert_eq!(env.get("B"), Some("file"));
    }

    #[test]
    fn keep_existing_first_duplicate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "A=first\nA=second\n").unwrap();

        let mut env = Environment::new();
        apply_file(&mut env, &path, Mode::KeepExisting).unwrap();
        assert_eq!(env.get("A"), Some("first"));
    }

    #[test]
    fn override_always_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev");
        fs::write(&path, "A=file\nA=later\n").unwrap();

        let mut env: Environment = [("A", "process")].into_iter().collect();
        apply_file(&mut env, &path, Mode::Override).unwrap();
        assert_eq!(env.get("A"), Some("later"));
    }

    #[test]
    fn malformed_file_applies_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "A=1\nBROKEN\n").unwrap();

        let mut env = Environment::new();
        let err = apply_file(&mut env, &path, Mode::Override).unwrap_err();
        assert!(matches!(err, FileError::Parse { .. }));
        assert!(env.is_empty());
    }

    #[test]
    fn empty_key_is_env_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "A=1\n=nokey\n").unwrap();

        let mut env = Environment::new();
        let err = apply_file(&mut env, &path, Mode::Override).unwrap_err();
        assert!(
            matches!(
                err,
                FileError::Env {
                    line: 2,
                    source: EnvError::EmptyKey,
                    ..
                }
            ),
            "{err:?}"
        );
    }

    // ── Loader ──

    #[test]
    fn candidate_order() {
        assert_eq!(candidates("foo"), ["foo", ".foo.gb", ".foo.env"]);
    }

    #[test]
    fn missing_default_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = Environment::new();
        let report = DotenvLoader::new(dir.path(), ".env")
            .load(&mut env, None)
            .unwrap();
        assert_eq!(report, LoadReport::default());
        assert!(env.is_empty());
    }

    #[test]
    fn malformed_default_aborts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".env"), "NOVALUE\n").unwrap();
        fs::write(dir.path().join("dev"), "A=1\n").unwrap();

        let mut env = Environment::new();
        let err = DotenvLoader::new(dir.path(), ".env")
            .load(&mut env, Some("dev"))
            .unwrap_err();
        assert!(matches!(err, LoadError::Default { .. }));
        let msg = err.to_string();
        assert!(msg.starts_with("load "), "{msg}");
        assert!(msg.contains("#1"), "{msg}");
        assert!(msg.contains("'NOVALUE'"), "{msg}");
        assert!(env.get("A").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_default_aborts_before_override() {
        let dir = tempfile::tempdir().unwrap();
        // Opening a directory succeeds on unix; reading it fails.
        fs::create_dir(dir.path().join(".env")).unwrap();
        fs::write(dir.path().join("dev"), "A=1\n").unwrap();

        let mut env = Environment::new();
        let err = DotenvLoader::new(dir.path(), ".env")
            .load(&mut env, Some("dev"))
            .unwrap_err();
        assert!(
            matches!(
                err,
                LoadError::Default {
                    source: FileError::Parse {
                        source: ParseError::Read { .. },
                        ..
                    }
                }
            ),
            "{err:?}"
        );
        assert!(env.get("A").is_none());
    }

    #[test]
    fn override_file_beats_default_and_process() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".env"), "A=default\nB=default\nC=default\n").unwrap();
        fs::write(dir.path().join(".dev.gb"), "A=override\n").unwrap();

        let mut env: Environment = [("B", "process")].into_iter().collect();
        let report = DotenvLoader::new(dir.path(), ".env")
            .load(&mut env, Some("dev"))
            .unwrap();
        assert_eq!(env.get("A"), Some("override"));
        assert_eq!(env.get("B"), Some("process"));
        assert_eq!(env.get("C"), Some("default"));
        assert_eq!(report.default_file, Some(dir.path().join(".env")));
        assert_eq!(report.override_file, Some(dir.path().join(".dev.gb")));
    }

    #[test]
    fn first_readable_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dev"), "A=plain\n").unwrap();
        fs::write(dir.path().join(".dev.gb"), "A=gb\n").unwrap();
        fs::write(dir.path().join(".dev.env"), "A=env\n").unwrap();

        let mut env = Environment::new();
        DotenvLoader::new(dir.path(), ".env")
            .load(&mut env, Some("dev"))
            .unwrap();
        assert_eq!(env.get("A"), Some("plain"));
    }

    #[test]
    fn later_candidates_not_examined() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".dev.gb"), "A=gb\n").unwrap();
        fs::write(dir.path().join(".dev.env"), "BROKEN\n").unwrap();

        let mut env = Environment::new();
        let report = DotenvLoader::new(dir.path(), ".env")
            .load(&mut env, Some("dev"))
            .unwrap();
        assert_eq!(env.get("A"), Some("gb"));
        assert_eq!(report.override_file, Some(dir.path().join(".dev.gb")));
    }

    #[test]
    fn malformed_candidate_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dev"), "BROKEN\nA=plain\n").unwrap();
        fs::write(dir.path().join(".dev.env"), "A=env\n").unwrap();

        let mut env = Environment::new();
        DotenvLoader::new(dir.path(), ".env")
            .load(&mut env, Some("dev"))
            .unwrap();
        assert_eq!(env.get("A"), Some("env"));
    }

    #[test]
    fn no_candidate_reports_all_three() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = Environment::new();
        let err = DotenvLoader::new(dir.path(), ".env")
            .load(&mut env, Some("missing"))
            .unwrap_err();
        match &err {
            LoadError::NoCandidate { name, failures } => {
                assert_eq!(name, "missing");
                let paths: Vec<_> = failures.iter().map(FileError::path).collect();
                assert_eq!(
                    paths,
                    vec![
                        dir.path().join("missing"),
                        dir.path().join(".missing.gb"),
                        dir.path().join(".missing.env"),
                    ]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let msg = err.to_string();
        assert!(msg.contains("missing.gb"), "{msg}");
        assert!(msg.contains("missing.env"), "{msg}");
    }

    #[test]
    fn tilde_in_name_uses_home_from_environment() {
        let home = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        fs::write(home.path().join("shared.env"), "A=home\n").unwrap();

        let mut env: Environment = [("HOME", home.path().to_str().unwrap())]
            .into_iter()
            .collect();
        DotenvLoader::new(work.path(), ".env")
            .load(&mut env, Some("~/shared.env"))
            .unwrap();
        assert_eq!(env.get("A"), Some("home"));
    }
}
