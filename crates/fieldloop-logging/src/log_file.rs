//! Newline-delimited JSON log files (`*.flog`).
//!
//! One [`LogTable`] per line.  [`LogFileWriter`] records them,
//! [`LogFileReader`] plays them back as a
//! [`ReplaySource`][crate::receiver::ReplaySource].

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use fieldloop_types::{FieldError, LogTable};
use tracing::info;

use crate::log_file_util::LOG_EXTENSION;
use crate::receiver::{DataReceiver, ReplaySource};

fn io_error(path: &Path, e: std::io::Error) -> FieldError {
    FieldError::Io {
        path: path.display().to_string(),
        details: e.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Writer
// ────────────────────────────────────────────────────────────────────────────

enum WriterTarget {
    /// Create a timestamped file inside this folder on start.
    Folder(PathBuf),
    /// Write to exactly this file.
    File(PathBuf),
}

/// Persists every cycle to a `.flog` file.
pub struct LogFileWriter {
    target: WriterTarget,
    path: Option<PathBuf>,
    out: Option<BufWriter<File>>,
}

impl LogFileWriter {
    /// Write to a new `fieldloop_YY-MM-DD_HH-MM-SS.flog` file in `folder`.
    pub fn in_folder(folder: impl Into<PathBuf>) -> Self {
        Self {
            target: WriterTarget::Folder(folder.into()),
            path: None,
            out: None,
        }
    }

    /// Write to exactly `path` (used when re-persisting a replayed log).
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            target: WriterTarget::File(path.into()),
            path: None,
            out: None,
        }
    }

    /// Path of the file being written.  `None` before start when writing to
    /// a folder.
    pub fn path(&self) -> Option<&Path> {
        match (&self.path, &self.target) {
            (Some(p), _) => Some(p),
            (None, WriterTarget::File(p)) => Some(p),
            (None, WriterTarget::Folder(_)) => None,
        }
    }

    fn resolve_path(&self) -> PathBuf {
        match &self.target {
            WriterTarget::File(p) => p.clone(),
            WriterTarget::Folder(folder) => {
                let stamp = chrono::Local::now().format("%y-%m-%d_%H-%M-%S");
                folder.join(format!("fieldloop_{stamp}.{LOG_EXTENSION}"))
            }
        }
    }
}

impl DataReceiver for LogFileWriter {
    fn name(&self) -> &str {
        "log_file_writer"
    }

    fn start(&mut self) -> Result<(), FieldError> {
        let path = self.resolve_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        let file = File::create(&path).map_err(|e| io_error(&path, e))?;
        info!(path = %path.display(), "log file opened");
        self.out = Some(BufWriter::new(file));
        self.path = Some(path);
        Ok(())
    }

    fn put_table(&mut self, table: &LogTable) -> Result<(), FieldError> {
        let Some(out) = self.out.as_mut() else {
            return Err(FieldError::LoggerNotStarted);
        };
        let line =
            serde_json::to_string(table).map_err(|e| FieldError::Serialization(e.to_string()))?;
        let path = self.path.as_deref().unwrap_or(Path::new(""));
        writeln!(out, "{line}").map_err(|e| io_error(path, e))
    }

    fn end(&mut self) -> Result<(), FieldError> {
        if let Some(mut out) = self.out.take() {
            let path = self.path.as_deref().unwrap_or(Path::new(""));
            out.flush().map_err(|e| io_error(path, e))?;
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Reader
// ────────────────────────────────────────────────────────────────────────────

/// Reads a `.flog` file back one table per cycle.
pub struct LogFileReader {
    path: PathBuf,
    lines: Option<std::io::Lines<BufReader<File>>>,
    line_no: usize,
}

impl LogFileReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lines: None,
            line_no: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReplaySource for LogFileReader {
    fn name(&self) -> &str {
        "log_file_reader"
    }

    fn start(&mut self) -> Result<(), FieldError> {
        let file = File::open(&self.path).map_err(|e| io_error(&self.path, e))?;
        info!(path = %self.path.display(), "replay log opened");
        self.lines = Some(BufReader::new(file).lines());
        Ok(())
    }

    fn next_table(&mut self) -> Result<Option<LogTable>, FieldError> {
        let Some(lines) = self.lines.as_mut() else {
            return Err(FieldError::LoggerNotStarted);
        };
        for line in lines.by_ref() {
            self.line_no += 1;
            let line = line.map_err(|e| io_error(&self.path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let table = serde_json::from_str(&line).map_err(|e| {
                FieldError::Serialization(format!(
                    "{}:{}: {e}",
                    self.path.display(),
                    self.line_no
                ))
            })?;
            return Ok(Some(table));
        }
        Ok(None)
    }

    fn end(&mut self) -> Result<(), FieldError> {
        self.lines = None;
        Ok(())
    }
}
