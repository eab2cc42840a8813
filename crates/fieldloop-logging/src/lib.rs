//! `fieldloop-logging` – Telemetry & Replay
//!
//! Records every control cycle as a [`LogTable`][fieldloop_types::LogTable]
//! and fans it out to the attached sinks, or feeds the loop from a recorded
//! log when replaying.
//!
//! # Modules
//!
//! - [`logger`] – [`Logger`][logger::Logger]: the process-scoped logging
//!   context.  Sinks and the replay source are attached before
//!   [`start`][logger::Logger::start] and fixed afterwards.
//! - [`receiver`] – the [`DataReceiver`][receiver::DataReceiver] and
//!   [`ReplaySource`][receiver::ReplaySource] traits every sink and source
//!   implements.
//! - [`log_file`] – [`LogFileWriter`][log_file::LogFileWriter] and
//!   [`LogFileReader`][log_file::LogFileReader]: newline-delimited JSON log
//!   files (`*.flog`).
//! - [`log_file_util`] – locating the log to replay and deriving companion
//!   file names.
//! - [`publisher`] – [`NetworkPublisher`][publisher::NetworkPublisher] and the
//!   WebSocket [`PublisherServer`][publisher::PublisherServer] that streams
//!   live tables to dashboards.
//! - [`hardware`] – [`HardwareTelemetry`][hardware::HardwareTelemetry]
//!   adapters that sample low-level actuator usage into every cycle.

pub mod hardware;
pub mod log_file;
pub mod log_file_util;
pub mod logger;
pub mod publisher;
pub mod receiver;

pub use hardware::{ActuatorTelemetry, HardwareTelemetry};
pub use log_file::{LogFileReader, LogFileWriter};
pub use log_file_util::{ReplayLogLocator, add_path_suffix, find_replay_log};
pub use logger::Logger;
pub use publisher::{DEFAULT_PUBLISHER_PORT, NetworkPublisher, PublisherServer};
pub use receiver::{DataReceiver, ReplaySource};
