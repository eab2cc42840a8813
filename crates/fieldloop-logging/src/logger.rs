//! [`Logger`] – process-scoped logging context.
//!
//! Constructed once at boot and handed to whoever drives the control loop.
//! There is no global instance.
//!
//! # Lifecycle
//!
//! 1. Attach sinks ([`add_data_receiver`][Logger::add_data_receiver]), at most
//!    one replay source ([`set_replay_source`][Logger::set_replay_source]) and
//!    any hardware telemetry adapters.
//! 2. [`start`][Logger::start].  From here on the attachment set is fixed;
//!    further attach calls return [`FieldError::LoggerAlreadyStarted`].
//! 3. Every cycle: [`periodic_before_user`][Logger::periodic_before_user],
//!    user code records outputs, then
//!    [`periodic_after_user`][Logger::periodic_after_user].
//! 4. [`end`][Logger::end] flushes and closes every sink.
//!
//! # Timestamps
//!
//! Live and simulated cycles are stamped with microseconds since
//! [`start`][Logger::start].  Replayed cycles keep the timestamp recorded in
//! the replay source, so a log re-persisted during replay lines up with the
//! original run entry for entry.

use std::collections::BTreeMap;
use std::time::Instant;

use fieldloop_types::{FieldError, LogTable, LogValue};
use tracing::{debug, info, warn};

use crate::hardware::HardwareTelemetry;
use crate::receiver::{DataReceiver, ReplaySource};

/// Key prefix for metadata entries written with the first cycle.
const METADATA_PREFIX: &str = "Metadata/";

#[derive(Default)]
pub struct Logger {
    receivers: Vec<Box<dyn DataReceiver>>,
    replay: Option<Box<dyn ReplaySource>>,
    hardware: Vec<Box<dyn HardwareTelemetry>>,
    metadata: BTreeMap<String, String>,
    running: bool,
    started_at: Option<Instant>,
    /// Table being assembled for the current cycle.
    current: LogTable,
    /// Inputs read from the replay source this cycle.
    replayed: LogTable,
    cycles: u64,
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Attachment (before start)
    // -------------------------------------------------------------------------

    pub fn add_data_receiver(&mut self, receiver: Box<dyn DataReceiver>) -> Result<(), FieldError> {
        self.ensure_not_started()?;
        debug!(receiver = receiver.name(), "data receiver attached");
        self.receivers.push(receiver);
        Ok(())
    }

    /// Attach the replay source.  At most one may be attached.
    pub fn set_replay_source(&mut self, source: Box<dyn ReplaySource>) -> Result<(), FieldError> {
        self.ensure_not_started()?;
        if self.replay.is_some() {
            return Err(FieldError::ReplaySourceAlreadySet);
        }
        debug!(source = source.name(), "replay source attached");
        self.replay = Some(source);
        Ok(())
    }

    pub fn register_hardware_telemetry(
        &mut self,
        adapter: Box<dyn HardwareTelemetry>,
    ) -> Result<(), FieldError> {
        self.ensure_not_started()?;
        self.hardware.push(adapter);
        Ok(())
    }

    /// Record a metadata string, written under `Metadata/<key>` with the
    /// first cycle.
    pub fn record_metadata(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), FieldError> {
        self.ensure_not_started()?;
        self.metadata.insert(key.into(), value.into());
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Introspection
    // -------------------------------------------------------------------------

    /// Names of the attached sinks, in attachment order.
    pub fn receiver_names(&self) -> Vec<&str> {
        self.receivers.iter().map(|r| r.name()).collect()
    }

    pub fn replay_source_name(&self) -> Option<&str> {
        self.replay.as_deref().map(|s| s.name())
    }

    pub fn is_replay(&self) -> bool {
        self.replay.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn hardware_adapter_count(&self) -> usize {
        self.hardware.len()
    }

    /// Number of cycles begun since start.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn timestamp_us(&self) -> u64 {
        self.current.timestamp_us
    }

    // -------------------------------------------------------------------------
    // Start / stop
    // -------------------------------------------------------------------------

    pub fn start(&mut self) -> Result<(), FieldError> {
        self.ensure_not_started()?;
        for receiver in &mut self.receivers {
            receiver.start()?;
        }
        if let Some(source) = self.replay.as_mut() {
            source.start()?;
        }
        self.running = true;
        self.started_at = Some(Instant::now());
        info!(
            receivers = ?self.receiver_names(),
            replay = ?self.replay_source_name(),
            hardware_adapters = self.hardware.len(),
            "logger started"
        );
        Ok(())
    }

    /// Flush and close every sink and the replay source.
    pub fn end(&mut self) -> Result<(), FieldError> {
        if !self.running {
            return Ok(());
        }
        self.running = false;
        let mut first_err = None;
        for receiver in &mut self.receivers {
            if let Err(e) = receiver.end() {
                warn!(receiver = receiver.name(), error = %e, "receiver failed to end");
                first_err.get_or_insert(e);
            }
        }
        if let Some(source) = self.replay.as_mut()
            && let Err(e) = source.end()
        {
            warn!(source = source.name(), error = %e, "replay source failed to end");
            first_err.get_or_insert(e);
        }
        info!(cycles = self.cycles, "logger ended");
        first_err.map_or(Ok(()), Err)
    }

    // -------------------------------------------------------------------------
    // Per-cycle API
    // -------------------------------------------------------------------------

    /// Open a new cycle.
    ///
    /// Returns `Ok(false)` when replaying and the recording is exhausted; the
    /// caller should stop the loop.
    pub fn periodic_before_user(&mut self) -> Result<bool, FieldError> {
        if !self.running {
            return Err(FieldError::LoggerNotStarted);
        }
        if let Some(source) = self.replay.as_mut() {
            match source.next_table()? {
                Some(table) => {
                    self.current = table.clone();
                    self.replayed = table;
                }
                None => {
                    info!(cycles = self.cycles, "replay source exhausted");
                    return Ok(false);
                }
            }
        } else {
            let elapsed = self
                .started_at
                .map(|t| t.elapsed().as_micros() as u64)
                .unwrap_or_default();
            self.current = LogTable::new(elapsed);
        }
        self.cycles += 1;
        Ok(true)
    }

    /// A replayed input for the current cycle.  Always `None` when not
    /// replaying.
    pub fn replayed(&self, key: &str) -> Option<&LogValue> {
        self.replayed.get(key)
    }

    /// Record an output for the current cycle, overwriting any replayed
    /// value under the same key.
    pub fn record_output(&mut self, key: impl Into<String>, value: impl Into<LogValue>) {
        self.current.put(key, value);
    }

    /// Close the current cycle: sample hardware adapters and hand the table to
    /// every sink in attachment order.
    pub fn periodic_after_user(&mut self) -> Result<(), FieldError> {
        if !self.running {
            return Err(FieldError::LoggerNotStarted);
        }
        if self.cycles == 1 {
            for (key, value) in &self.metadata {
                self.current
                    .put(format!("{METADATA_PREFIX}{key}"), value.as_str());
            }
        }
        for adapter in &mut self.hardware {
            adapter.sample(&mut self.current)?;
        }
        for receiver in &mut self.receivers {
            receiver.put_table(&self.current)?;
        }
        Ok(())
    }

    fn ensure_not_started(&self) -> Result<(), FieldError> {
        if self.running {
            Err(FieldError::LoggerAlreadyStarted)
        } else {
            Ok(())
        }
    }
}
