//! [`Scheduler`] – the command-scheduling facility.
//!
//! The robot lifecycle only ever talks to the [`Scheduler`] trait; tests
//! substitute a recording fake.  [`CommandScheduler`] is the in-process
//! implementation used by the `fieldloop` binary.
//!
//! # Semantics
//!
//! * `schedule` initialises the command immediately and returns a fresh
//!   [`CommandHandle`].
//! * `run` executes every scheduled command once, in scheduling order; a
//!   command reporting `is_finished` afterwards is ended with
//!   `interrupted = false` and dropped.
//! * `cancel` ends the command with `interrupted = true` and drops it.
//!   Cancelling an unknown or already-finished handle is a no-op.
//! * `cancel_all` cancels every scheduled command; calling it on an empty
//!   schedule is a no-op.

use std::fmt;

use fieldloop_types::FieldError;
use tracing::debug;
use uuid::Uuid;

use crate::command::Command;

/// Opaque reference to a scheduled command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandHandle(Uuid);

impl CommandHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CommandHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CommandHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The scheduling facility the robot lifecycle drives.
pub trait Scheduler {
    /// Advance every scheduled command by one step.
    fn run(&mut self) -> Result<(), FieldError>;

    fn schedule(&mut self, command: Box<dyn Command>) -> Result<CommandHandle, FieldError>;

    fn cancel(&mut self, handle: CommandHandle) -> Result<(), FieldError>;

    fn cancel_all(&mut self) -> Result<(), FieldError>;

    fn is_scheduled(&self, handle: CommandHandle) -> bool;

    fn scheduled_count(&self) -> usize;
}

struct Scheduled {
    handle: CommandHandle,
    command: Box<dyn Command>,
}

#[derive(Default)]
pub struct CommandScheduler {
    scheduled: Vec<Scheduled>,
}

impl CommandScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the scheduled commands, in scheduling order.
    pub fn scheduled_names(&self) -> Vec<&str> {
        self.scheduled.iter().map(|s| s.command.name()).collect()
    }
}

impl Scheduler for CommandScheduler {
    fn run(&mut self) -> Result<(), FieldError> {
        let mut i = 0;
        while i < self.scheduled.len() {
            let entry = &mut self.scheduled[i];
            entry.command.execute()?;
            if entry.command.is_finished() {
                let mut done = self.scheduled.remove(i);
                debug!(command = done.command.name(), handle = %done.handle, "command finished");
                done.command.end(false)?;
            } else {
                i += 1;
            }
        }
        Ok(())
    }

    fn schedule(&mut self, mut command: Box<dyn Command>) -> Result<CommandHandle, FieldError> {
        command.initialize()?;
        let handle = CommandHandle::new();
        debug!(command = command.name(), %handle, "command scheduled");
        self.scheduled.push(Scheduled { handle, command });
        Ok(handle)
    }

    fn cancel(&mut self, handle: CommandHandle) -> Result<(), FieldError> {
        let Some(pos) = self.scheduled.iter().position(|s| s.handle == handle) else {
            return Ok(());
        };
        let mut entry = self.scheduled.remove(pos);
        debug!(command = entry.command.name(), %handle, "command cancelled");
        entry.command.end(true)
    }

    fn cancel_all(&mut self) -> Result<(), FieldError> {
        let mut first_err = None;
        for mut entry in std::mem::take(&mut self.scheduled) {
            debug!(command = entry.command.name(), handle = %entry.handle, "command cancelled");
            if let Err(e) = entry.command.end(true) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn is_scheduled(&self, handle: CommandHandle) -> bool {
        self.scheduled.iter().any(|s| s.handle == handle)
    }

    fn scheduled_count(&self) -> usize {
        self.scheduled.len()
    }
}
