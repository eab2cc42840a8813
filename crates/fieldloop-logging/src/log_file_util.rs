//! Finding the log to replay and naming companion files.
//!
//! # Lookup order
//!
//! [`find_replay_log`] tries each location in turn and returns the first that
//! names an existing file:
//!
//! | # | Location |
//! |---|---|
//! | 1 | `FIELDLOOP_LOG_PATH` environment variable |
//! | 2 | path stored in `<temp dir>/fieldloop-log-path.txt` (written by log viewers) |
//! | 3 | newest `*.flog` file in the default log folder |
//!
//! When every location fails the error lists them all, so the operator can
//! see what was tried.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use fieldloop_types::FieldError;
use tracing::info;

/// Environment variable naming the log to replay.
pub const LOG_PATH_ENV: &str = "FIELDLOOP_LOG_PATH";

/// File in the system temp dir holding the path of the log to replay.
pub const LOG_PATH_FILE: &str = "fieldloop-log-path.txt";

/// Folder live logs are written to when nothing else is configured.
pub const DEFAULT_LOG_FOLDER: &str = "logs";

pub const LOG_EXTENSION: &str = "flog";

/// Configurable replay-log lookup.  [`find_replay_log`] uses
/// [`ReplayLogLocator::from_env`] with the default folder.
#[derive(Debug, Clone)]
pub struct ReplayLogLocator {
    env_path: Option<PathBuf>,
    path_file: PathBuf,
    search_dir: PathBuf,
}

impl ReplayLogLocator {
    pub fn new(env_path: Option<PathBuf>, path_file: PathBuf, search_dir: PathBuf) -> Self {
        Self {
            env_path,
            path_file,
            search_dir,
        }
    }

    /// Capture `FIELDLOOP_LOG_PATH` and the temp-dir path file now; search
    /// `search_dir` as the last resort.
    pub fn from_env(search_dir: impl Into<PathBuf>) -> Self {
        Self::new(
            std::env::var_os(LOG_PATH_ENV).map(PathBuf::from),
            std::env::temp_dir().join(LOG_PATH_FILE),
            search_dir.into(),
        )
    }

    pub fn locate(&self) -> Result<PathBuf, FieldError> {
        let mut tried = Vec::new();

        match &self.env_path {
            Some(p) if p.is_file() => return Ok(found(p.clone(), "environment")),
            Some(p) => tried.push(format!("${LOG_PATH_ENV}={}", p.display())),
            None => tried.push(format!("${LOG_PATH_ENV} (unset)")),
        }

        if let Some(p) = read_path_file(&self.path_file) {
            if p.is_file() {
                return Ok(found(p, "path file"));
            }
            tried.push(format!("{} -> {}", self.path_file.display(), p.display()));
        } else {
            tried.push(self.path_file.display().to_string());
        }

        if let Some(p) = newest_log_in(&self.search_dir) {
            return Ok(found(p, "log folder"));
        }
        tried.push(format!(
            "{}/*.{LOG_EXTENSION}",
            self.search_dir.display()
        ));

        Err(FieldError::ReplayLogNotFound { tried })
    }
}

fn found(path: PathBuf, via: &str) -> PathBuf {
    info!(path = %path.display(), via, "replay log located");
    path
}

fn read_path_file(path_file: &Path) -> Option<PathBuf> {
    let raw = fs::read_to_string(path_file).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

/// Locate the most recent applicable log using the default conventions.
pub fn find_replay_log() -> Result<PathBuf, FieldError> {
    ReplayLogLocator::from_env(DEFAULT_LOG_FOLDER).locate()
}

/// The most recently modified `*.flog` file directly inside `dir`.
pub fn newest_log_in(dir: &Path) -> Option<PathBuf> {
    fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == LOG_EXTENSION))
        .filter_map(|p| {
            let modified = fs::metadata(&p).and_then(|m| m.modified()).ok()?;
            Some((modified, p))
        })
        .max()
        .map(|(_, p)| p)
}

/// Derive a companion file name by inserting `suffix` before the extension.
///
/// Repeated derivations never collide with their source:
///
/// ```rust
/// use std::path::Path;
/// use fieldloop_logging::add_path_suffix;
///
/// assert_eq!(add_path_suffix(Path::new("a.flog"), "_sim"), Path::new("a_sim.flog"));
/// assert_eq!(add_path_suffix(Path::new("a_sim.flog"), "_sim"), Path::new("a_sim_2.flog"));
/// assert_eq!(add_path_suffix(Path::new("a_sim_2.flog"), "_sim"), Path::new("a_sim_3.flog"));
/// ```
pub fn add_path_suffix(path: &Path, suffix: &str) -> PathBuf {
    let Some(stem) = path.file_stem() else {
        return path.to_path_buf();
    };

    // Names that are not UTF-8 get the plain suffix without numbering.
    let mut name = match stem.to_str() {
        Some(stem) if stem.ends_with(suffix) => OsString::from(format!("{stem}_2")),
        Some(stem) => match numbered_stem(stem, suffix) {
            Some((head, n)) => OsString::from(format!("{head}_{}", n + 1)),
            None => OsString::from(format!("{stem}{suffix}")),
        },
        None => {
            let mut name = stem.to_os_string();
            name.push(suffix);
            name
        }
    };
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}

/// Split `<base><suffix>_<n>` into (`<base><suffix>`, n).
fn numbered_stem<'a>(stem: &'a str, suffix: &str) -> Option<(&'a str, u64)> {
    let (head, digits) = stem.rsplit_once('_')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !head.ends_with(suffix) {
        return None;
    }
    digits.parse().ok().map(|n| (head, n))
}
