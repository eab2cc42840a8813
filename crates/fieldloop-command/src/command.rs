//! The [`Command`] trait and built-in commands.
//!
//! | Command | Finishes |
//! |---|---|
//! | [`InstantCommand`] | after its single action has run once |
//! | [`TimedCommand`] | after running its action for a fixed number of periods |
//! | [`SequentialCommand`] | when its last child finishes |
//!
//! # Example
//!
//! ```rust
//! use fieldloop_command::{Command, InstantCommand, SequentialCommand, TimedCommand};
//!
//! let mut auto = SequentialCommand::new(
//!     "drive_then_stop",
//!     vec![
//!         Box::new(TimedCommand::new("drive", 2, |_| Ok(()))),
//!         Box::new(InstantCommand::new("stop", || Ok(()))),
//!     ],
//! );
//! auto.initialize().unwrap();
//! while !auto.is_finished() {
//!     auto.execute().unwrap();
//! }
//! ```

use fieldloop_types::FieldError;

/// A unit of robot behaviour advanced once per control period.
///
/// The scheduler calls `initialize` once when the command is scheduled,
/// `execute` once per period while it is scheduled, and `end` exactly once
/// when it finishes (`interrupted = false`) or is cancelled
/// (`interrupted = true`).
pub trait Command: Send {
    fn name(&self) -> &str;

    fn initialize(&mut self) -> Result<(), FieldError> {
        Ok(())
    }

    fn execute(&mut self) -> Result<(), FieldError>;

    /// Polled after every `execute`.  Defaults to never finishing.
    fn is_finished(&self) -> bool {
        false
    }

    fn end(&mut self, _interrupted: bool) -> Result<(), FieldError> {
        Ok(())
    }
}

type Action = Box<dyn FnMut() -> Result<(), FieldError> + Send>;
type TimedAction = Box<dyn FnMut(u32) -> Result<(), FieldError> + Send>;
type EndAction = Box<dyn FnMut(bool) -> Result<(), FieldError> + Send>;

// ─────────────────────────────────────────────────────────────────────────────
// InstantCommand
// ─────────────────────────────────────────────────────────────────────────────

/// Runs one action on its first `execute` and finishes.
pub struct InstantCommand {
    name: String,
    action: Action,
    done: bool,
}

impl InstantCommand {
    pub fn new(
        name: impl Into<String>,
        action: impl FnMut() -> Result<(), FieldError> + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            action: Box::new(action),
            done: false,
        }
    }
}

impl Command for InstantCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self) -> Result<(), FieldError> {
        self.done = false;
        Ok(())
    }

    fn execute(&mut self) -> Result<(), FieldError> {
        if !self.done {
            (self.action)()?;
            self.done = true;
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.done
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TimedCommand
// ─────────────────────────────────────────────────────────────────────────────

/// Runs an action for a fixed number of periods.  The action receives the
/// zero-based period index.
pub struct TimedCommand {
    name: String,
    periods: u32,
    elapsed: u32,
    action: TimedAction,
    on_end: Option<EndAction>,
}

impl TimedCommand {
    pub fn new(
        name: impl Into<String>,
        periods: u32,
        action: impl FnMut(u32) -> Result<(), FieldError> + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            periods,
            elapsed: 0,
            action: Box::new(action),
            on_end: None,
        }
    }

    /// Run `on_end` when the command ends, finished or interrupted.
    pub fn with_end(
        mut self,
        on_end: impl FnMut(bool) -> Result<(), FieldError> + Send + 'static,
    ) -> Self {
        self.on_end = Some(Box::new(on_end));
        self
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }
}

impl Command for TimedCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self) -> Result<(), FieldError> {
        self.elapsed = 0;
        Ok(())
    }

    fn execute(&mut self) -> Result<(), FieldError> {
        if self.elapsed < self.periods {
            (self.action)(self.elapsed)?;
            self.elapsed += 1;
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.elapsed >= self.periods
    }

    fn end(&mut self, interrupted: bool) -> Result<(), FieldError> {
        match self.on_end.as_mut() {
            Some(f) => f(interrupted),
            None => Ok(()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SequentialCommand
// ─────────────────────────────────────────────────────────────────────────────

/// Runs children one after another.  A child that finishes is ended and the
/// next one is initialised in the same period.
pub struct SequentialCommand {
    name: String,
    children: Vec<Box<dyn Command>>,
    index: usize,
}

impl SequentialCommand {
    pub fn new(name: impl Into<String>, children: Vec<Box<dyn Command>>) -> Self {
        Self {
            name: name.into(),
            children,
            index: 0,
        }
    }

    /// Index of the child currently running.
    pub fn current_index(&self) -> usize {
        self.index
    }
}

impl Command for SequentialCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self) -> Result<(), FieldError> {
        self.index = 0;
        match self.children.first_mut() {
            Some(first) => first.initialize(),
            None => Ok(()),
        }
    }

    fn execute(&mut self) -> Result<(), FieldError> {
        let Some(child) = self.children.get_mut(self.index) else {
            return Ok(());
        };
        child.execute()?;
        if child.is_finished() {
            child.end(false)?;
            self.index += 1;
            if let Some(next) = self.children.get_mut(self.index) {
                next.initialize()?;
            }
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.index >= self.children.len()
    }

    fn end(&mut self, interrupted: bool) -> Result<(), FieldError> {
        if interrupted && let Some(child) = self.children.get_mut(self.index) {
            child.end(true)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn log() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn instant_command_runs_once() {
        let calls = log();
        let c = calls.clone();
        let mut cmd = InstantCommand::new("fire", move || {
            c.lock().unwrap().push("fire".into());
            Ok(())
        });
        cmd.initialize().unwrap();
        assert!(!cmd.is_finished());
        cmd.execute().unwrap();
        cmd.execute().unwrap();
        assert!(cmd.is_finished());
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn timed_command_counts_periods() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let mut cmd = TimedCommand::new("drive", 3, move |i| {
            s.lock().unwrap().push(i);
            Ok(())
        });
        cmd.initialize().unwrap();
        while !cmd.is_finished() {
            cmd.execute().unwrap();
        }
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(cmd.elapsed(), 3);
    }

    #[test]
    fn timed_command_end_reports_interruption() {
        let ended = Arc::new(Mutex::new(None));
        let e = ended.clone();
        let mut cmd = TimedCommand::new("drive", 10, |_| Ok(())).with_end(move |interrupted| {
            *e.lock().unwrap() = Some(interrupted);
            Ok(())
        });
        cmd.initialize().unwrap();
        cmd.execute().unwrap();
        cmd.end(true).unwrap();
        assert_eq!(*ended.lock().unwrap(), Some(true));
    }

    #[test]
    fn action_errors_propagate() {
        let mut cmd = InstantCommand::new("bad", || {
            Err(FieldError::Command {
                name: "bad".into(),
                details: "boom".into(),
            })
        });
        assert!(cmd.execute().is_err());
        assert!(!cmd.is_finished());
    }

    #[test]
    fn sequence_advances_through_children() {
        let calls = log();
        let (a, b) = (calls.clone(), calls.clone());
        let mut seq = SequentialCommand::new(
            "seq",
            vec![
                Box::new(TimedCommand::new("a", 2, move |_| {
                    a.lock().unwrap().push("a".into());
                    Ok(())
                })),
                Box::new(InstantCommand::new("b", move || {
                    b.lock().unwrap().push("b".into());
                    Ok(())
                })),
            ],
        );
        seq.initialize().unwrap();
        seq.execute().unwrap();
        assert_eq!(seq.current_index(), 0);
        seq.execute().unwrap();
        assert_eq!(seq.current_index(), 1);
        seq.execute().unwrap();
        assert!(seq.is_finished());
        assert_eq!(*calls.lock().unwrap(), vec!["a", "a", "b"]);
    }

    #[test]
    fn interrupted_sequence_ends_running_child() {
        let ended = Arc::new(Mutex::new(false));
        let e = ended.clone();
        let mut seq = SequentialCommand::new(
            "seq",
            vec![Box::new(TimedCommand::new("long", 100, |_| Ok(())).with_end(
                move |interrupted| {
                    *e.lock().unwrap() = interrupted;
                    Ok(())
                },
            ))],
        );
        seq.initialize().unwrap();
        seq.execute().unwrap();
        seq.end(true).unwrap();
        assert!(*ended.lock().unwrap());
    }

    #[test]
    fn empty_sequence_is_finished() {
        let mut seq = SequentialCommand::new("empty", Vec::new());
        seq.initialize().unwrap();
        assert!(seq.is_finished());
    }
}
