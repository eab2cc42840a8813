use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Runtime environment the process was started in.  Resolved once at boot
/// and fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Attached to real actuation hardware.
    Live,
    /// No hardware; running against simulated drivers.
    Simulated,
    /// No hardware; inputs are read back from a previously recorded log.
    Replay,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Live => write!(f, "live"),
            Mode::Simulated => write!(f, "simulated"),
            Mode::Replay => write!(f, "replay"),
        }
    }
}

/// Operational segment of a robot's run.  Transitions are driven by an
/// external phase controller (field management system or match timeline).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Disabled,
    Autonomous,
    Teleop,
    Test,
}

impl Phase {
    /// Stable label used when the phase is written to or read from a log.
    pub const fn label(self) -> &'static str {
        match self {
            Phase::Disabled => "Disabled",
            Phase::Autonomous => "Autonomous",
            Phase::Teleop => "Teleop",
            Phase::Test => "Test",
        }
    }

    /// Inverse of [`Phase::label`].
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Disabled" => Some(Phase::Disabled),
            "Autonomous" => Some(Phase::Autonomous),
            "Teleop" => Some(Phase::Teleop),
            "Test" => Some(Phase::Test),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single logged value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum LogValue {
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Text(String),
    DoubleArray(Vec<f64>),
}

impl From<bool> for LogValue {
    fn from(v: bool) -> Self {
        LogValue::Boolean(v)
    }
}

impl From<i64> for LogValue {
    fn from(v: i64) -> Self {
        LogValue::Integer(v)
    }
}

impl From<f64> for LogValue {
    fn from(v: f64) -> Self {
        LogValue::Double(v)
    }
}

impl From<&str> for LogValue {
    fn from(v: &str) -> Self {
        LogValue::Text(v.to_string())
    }
}

impl From<String> for LogValue {
    fn from(v: String) -> Self {
        LogValue::Text(v)
    }
}

impl From<Vec<f64>> for LogValue {
    fn from(v: Vec<f64>) -> Self {
        LogValue::DoubleArray(v)
    }
}

/// One control cycle's worth of log data.
///
/// Keys are slash-separated paths (e.g. `"DriverStation/Phase"`).  The map is
/// ordered so that serialised tables are stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogTable {
    /// Microseconds since the logger started (or the replayed timestamp).
    pub timestamp_us: u64,
    pub entries: BTreeMap<String, LogValue>,
}

impl LogTable {
    pub fn new(timestamp_us: u64) -> Self {
        Self {
            timestamp_us,
            entries: BTreeMap::new(),
        }
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<LogValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&LogValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Error type shared by every fieldloop crate.
///
/// The control loop has no degraded mode: any of these reaching the loop
/// driver ends the run.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldError {
    #[error("No replay log found (tried: {})", tried.join(", "))]
    ReplayLogNotFound { tried: Vec<String> },

    #[error("Logger already started; sinks and sources are fixed after start")]
    LoggerAlreadyStarted,

    #[error("Logger not started")]
    LoggerNotStarted,

    #[error("A replay source is already attached")]
    ReplaySourceAlreadySet,

    #[error("I/O error on {path}: {details}")]
    Io { path: String, details: String },

    #[error("Serialization Error: {0}")]
    Serialization(String),

    #[error("Command '{name}' failed: {details}")]
    Command { name: String, details: String },

    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("Config Error: {0}")]
    Config(String),
}
