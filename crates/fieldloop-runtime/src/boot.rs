//! Mode-dependent sink wiring.
//!
//! [`sink_plan`] is a pure data table mapping the resolved [`Mode`] to an
//! ordered list of [`SinkDirective`]s:
//!
//! | Mode | Directives |
//! |---|---|
//! | `Live` | write log to folder, publish to network |
//! | `Simulated` | publish to network |
//! | `Replay` | disable timing, replay latest log, write log derived from the replay name |
//!
//! [`apply_plan`] executes a plan against a [`Logger`], asking a
//! [`SinkFactory`] for the concrete sinks.  Tests pass a factory that hands
//! out fakes.

use std::path::{Path, PathBuf};

use fieldloop_logging::{
    DataReceiver, LogFileReader, LogFileWriter, Logger, NetworkPublisher, ReplayLogLocator,
    ReplaySource, add_path_suffix,
};
use fieldloop_types::{FieldError, Mode};
use tracing::info;

/// Suffix appended to the replay log's name for the re-persisted copy.
pub const REPLAY_SUFFIX: &str = "_sim";

/// One step of boot-time sink wiring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkDirective {
    /// Run the loop as fast as the host allows instead of once per period.
    DisableTiming,
    /// Persistent log writer in the configured log folder.
    WriteLogToFolder,
    /// Attach the most recent recorded log as the replay source.
    ReplayFromLatestLog,
    /// Persistent log writer next to the replay source, name suffixed.
    WriteLogDerivedFromReplay { suffix: &'static str },
    /// Network telemetry publisher.
    PublishNetwork,
}

pub fn sink_plan(mode: Mode) -> Vec<SinkDirective> {
    match mode {
        Mode::Live => vec![SinkDirective::WriteLogToFolder, SinkDirective::PublishNetwork],
        Mode::Simulated => vec![SinkDirective::PublishNetwork],
        Mode::Replay => vec![
            SinkDirective::DisableTiming,
            SinkDirective::ReplayFromLatestLog,
            SinkDirective::WriteLogDerivedFromReplay {
                suffix: REPLAY_SUFFIX,
            },
        ],
    }
}

/// Builds the concrete sinks a plan asks for.
pub trait SinkFactory {
    fn folder_log_writer(&mut self) -> Box<dyn DataReceiver>;

    fn file_log_writer(&mut self, path: &Path) -> Box<dyn DataReceiver>;

    fn network_publisher(&mut self) -> Box<dyn DataReceiver>;

    /// # Errors
    ///
    /// [`FieldError::ReplayLogNotFound`] when no recorded log can be found.
    fn locate_replay_log(&mut self) -> Result<PathBuf, FieldError>;

    fn replay_source(&mut self, path: &Path) -> Box<dyn ReplaySource>;
}

/// Factory producing the real file and network sinks.
pub struct DefaultSinkFactory {
    log_folder: PathBuf,
    publisher: NetworkPublisher,
    locator: ReplayLogLocator,
}

impl DefaultSinkFactory {
    /// `publisher` is cloned into the logger; keep the original to serve it.
    pub fn new(log_folder: impl Into<PathBuf>, publisher: NetworkPublisher) -> Self {
        let log_folder = log_folder.into();
        Self {
            locator: ReplayLogLocator::from_env(&log_folder),
            log_folder,
            publisher,
        }
    }

    pub fn with_locator(mut self, locator: ReplayLogLocator) -> Self {
        self.locator = locator;
        self
    }
}

impl SinkFactory for DefaultSinkFactory {
    fn folder_log_writer(&mut self) -> Box<dyn DataReceiver> {
        Box::new(LogFileWriter::in_folder(&self.log_folder))
    }

    fn file_log_writer(&mut self, path: &Path) -> Box<dyn DataReceiver> {
        Box::new(LogFileWriter::to_file(path))
    }

    fn network_publisher(&mut self) -> Box<dyn DataReceiver> {
        Box::new(self.publisher.clone())
    }

    fn locate_replay_log(&mut self) -> Result<PathBuf, FieldError> {
        self.locator.locate()
    }

    fn replay_source(&mut self, path: &Path) -> Box<dyn ReplaySource> {
        Box::new(LogFileReader::new(path))
    }
}

/// What boot decided beyond the sinks themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootOutcome {
    /// `false` once [`SinkDirective::DisableTiming`] has been applied.
    pub use_timing: bool,
    pub replay_log: Option<PathBuf>,
    pub derived_log: Option<PathBuf>,
}

/// Apply `plan` to `logger` in order.
///
/// # Errors
///
/// Propagates lookup and attachment failures.  A derived writer before any
/// replay source, or one whose name resolves to the replay log itself, is a
/// [`FieldError::Config`] error.
pub fn apply_plan(
    plan: &[SinkDirective],
    logger: &mut Logger,
    factory: &mut dyn SinkFactory,
) -> Result<BootOutcome, FieldError> {
    let mut outcome = BootOutcome {
        use_timing: true,
        replay_log: None,
        derived_log: None,
    };

    for directive in plan {
        match directive {
            SinkDirective::DisableTiming => outcome.use_timing = false,
            SinkDirective::WriteLogToFolder => {
                logger.add_data_receiver(factory.folder_log_writer())?;
            }
            SinkDirective::PublishNetwork => {
                logger.add_data_receiver(factory.network_publisher())?;
            }
            SinkDirective::ReplayFromLatestLog => {
                let path = factory.locate_replay_log()?;
                logger.set_replay_source(factory.replay_source(&path))?;
                outcome.replay_log = Some(path);
            }
            SinkDirective::WriteLogDerivedFromReplay { suffix } => {
                let Some(source) = outcome.replay_log.as_deref() else {
                    return Err(FieldError::Config(
                        "derived log writer requires a replay source earlier in the plan"
                            .to_string(),
                    ));
                };
                let derived = add_path_suffix(source, suffix);
                if derived == source {
                    return Err(FieldError::Config(format!(
                        "derived log {} would overwrite the replay log",
                        derived.display()
                    )));
                }
                logger.add_data_receiver(factory.file_log_writer(&derived))?;
                outcome.derived_log = Some(derived);
            }
        }
    }

    info!(
        use_timing = outcome.use_timing,
        replay_log = ?outcome.replay_log,
        derived_log = ?outcome.derived_log,
        "sink plan applied"
    );
    Ok(outcome)
}
