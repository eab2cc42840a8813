//! Run configuration – reads `fieldloop.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use fieldloop_hal::probe::DEFAULT_HARDWARE_MARKER;
use fieldloop_logging::DEFAULT_PUBLISHER_PORT;
use fieldloop_logging::log_file_util::DEFAULT_LOG_FOLDER;
use fieldloop_types::FieldError;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "FIELDLOOP_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "fieldloop.toml";

/// Routine the demo container schedules when autonomous begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutonomousRoutine {
    #[default]
    DriveForward,
    None,
}

impl std::str::FromStr for AutonomousRoutine {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drive_forward" => Ok(Self::DriveForward),
            "none" => Ok(Self::None),
            other => Err(FieldError::Config(format!(
                "unknown autonomous routine {other:?} (expected \"drive_forward\" or \"none\")"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Control loop period in milliseconds.
    pub period_ms: u64,
    pub log_folder: PathBuf,
    /// WebSocket port for live telemetry.
    pub publisher_port: u16,
    /// File whose presence marks a real robot.
    pub hardware_marker: PathBuf,
    pub autonomous: AutonomousRoutine,
    /// Match timeline, in seconds per segment.
    pub disabled_secs: f64,
    pub autonomous_secs: f64,
    pub teleop_secs: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            period_ms: 20,
            log_folder: PathBuf::from(DEFAULT_LOG_FOLDER),
            publisher_port: DEFAULT_PUBLISHER_PORT,
            hardware_marker: PathBuf::from(DEFAULT_HARDWARE_MARKER),
            autonomous: AutonomousRoutine::default(),
            disabled_secs: 1.0,
            autonomous_secs: 15.0,
            teleop_secs: 135.0,
        }
    }
}

impl Config {
    pub fn period(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.period_ms)
    }
}

/// `$FIELDLOOP_CONFIG`, or `./fieldloop.toml`.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load the config with environment overrides applied.  A missing file
/// yields the defaults.
pub fn load() -> Result<Config, FieldError> {
    let mut cfg = load_from(&config_path())?.unwrap_or_default();
    apply_overrides(&mut cfg, |key| std::env::var(key).ok())?;
    Ok(cfg)
}

/// Load the config from a specific path.  Returns `None` if the file does
/// not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, FieldError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| FieldError::Io {
        path: path.display().to_string(),
        details: e.to_string(),
    })?;
    let cfg = toml::from_str(&raw)
        .map_err(|e| FieldError::Config(format!("{}: {e}", path.display())))?;
    Ok(Some(cfg))
}

/// Apply `FIELDLOOP_*` overrides looked up through `var`.
///
/// | Variable | Config field |
/// |---|---|
/// | `FIELDLOOP_PERIOD_MS` | `period_ms` |
/// | `FIELDLOOP_LOG_FOLDER` | `log_folder` |
/// | `FIELDLOOP_PUBLISHER_PORT` | `publisher_port` |
/// | `FIELDLOOP_AUTONOMOUS` | `autonomous` |
///
/// Numbers that fail to parse are ignored; an unknown routine name is an
/// error.
pub fn apply_overrides(
    cfg: &mut Config,
    var: impl Fn(&str) -> Option<String>,
) -> Result<(), FieldError> {
    if let Some(v) = var("FIELDLOOP_PERIOD_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.period_ms = ms;
    }
    if let Some(v) = var("FIELDLOOP_LOG_FOLDER") {
        cfg.log_folder = PathBuf::from(v);
    }
    if let Some(v) = var("FIELDLOOP_PUBLISHER_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.publisher_port = port;
    }
    if let Some(v) = var("FIELDLOOP_AUTONOMOUS") {
        cfg.autonomous = v.parse()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let result = load_from(&dir.path().join("fieldloop.toml")).expect("no error");
        assert!(result.is_none());
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("fieldloop.toml");
        fs::write(&path, "period_ms = 10\nautonomous = \"none\"\n").unwrap();

        let cfg = load_from(&path).expect("load ok").expect("some");
        assert_eq!(cfg.period_ms, 10);
        assert_eq!(cfg.autonomous, AutonomousRoutine::None);
        assert_eq!(cfg.publisher_port, DEFAULT_PUBLISHER_PORT);
        assert_eq!(cfg.log_folder, PathBuf::from("logs"));
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("fieldloop.toml");
        fs::write(&path, "period_ms = \"fast\"").unwrap();
        assert!(matches!(load_from(&path), Err(FieldError::Config(_))));
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut cfg = Config::default();
        apply_overrides(
            &mut cfg,
            vars(&[
                ("FIELDLOOP_PERIOD_MS", "5"),
                ("FIELDLOOP_LOG_FOLDER", "/var/log/robot"),
                ("FIELDLOOP_PUBLISHER_PORT", "5999"),
                ("FIELDLOOP_AUTONOMOUS", "none"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.period_ms, 5);
        assert_eq!(cfg.log_folder, PathBuf::from("/var/log/robot"));
        assert_eq!(cfg.publisher_port, 5999);
        assert_eq!(cfg.autonomous, AutonomousRoutine::None);
    }

    #[test]
    fn unparsable_numbers_are_ignored() {
        let mut cfg = Config::default();
        apply_overrides(
            &mut cfg,
            vars(&[
                ("FIELDLOOP_PERIOD_MS", "soon"),
                ("FIELDLOOP_PUBLISHER_PORT", "not-a-port"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn unknown_routine_is_rejected() {
        let mut cfg = Config::default();
        let err = apply_overrides(&mut cfg, vars(&[("FIELDLOOP_AUTONOMOUS", "spin")])).unwrap_err();
        assert!(matches!(err, FieldError::Config(_)));
    }

    #[test]
    fn period_converts_to_duration() {
        let cfg = Config {
            period_ms: 20,
            ..Config::default()
        };
        assert_eq!(cfg.period(), std::time::Duration::from_millis(20));
    }
}
