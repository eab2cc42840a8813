//! Sink and source traits.
//!
//! The [`Logger`][crate::logger::Logger] never knows where its data goes or
//! comes from.  Sinks implement [`DataReceiver`]; the single optional replay
//! source implements [`ReplaySource`].

use fieldloop_types::{FieldError, LogTable};

/// A destination for logged cycles (log file, network publisher, …).
///
/// # Contract
///
/// * `start` – called once by [`Logger::start`][crate::logger::Logger::start],
///   before the first table.
/// * `put_table` – called once per cycle, in attachment order.
/// * `end` – called once when the logger shuts down; flush here.
pub trait DataReceiver: Send {
    /// Short, stable name used in boot reports and diagnostics.
    fn name(&self) -> &str;

    fn start(&mut self) -> Result<(), FieldError> {
        Ok(())
    }

    fn put_table(&mut self, table: &LogTable) -> Result<(), FieldError>;

    fn end(&mut self) -> Result<(), FieldError> {
        Ok(())
    }
}

/// A previously recorded stream substituted for live inputs.
pub trait ReplaySource: Send {
    fn name(&self) -> &str;

    fn start(&mut self) -> Result<(), FieldError> {
        Ok(())
    }

    /// Next recorded cycle, or `None` once the recording is exhausted.
    fn next_table(&mut self) -> Result<Option<LogTable>, FieldError>;

    fn end(&mut self) -> Result<(), FieldError> {
        Ok(())
    }
}
