//! `fieldloop-command` – Command-based scheduling
//!
//! Robot behaviour is expressed as [`Command`]s that a [`Scheduler`] advances
//! one step per control period.
//!
//! # Modules
//!
//! - [`command`] – the [`Command`] trait plus the built-in
//!   [`InstantCommand`], [`TimedCommand`], and [`SequentialCommand`].
//! - [`scheduler`] – the [`Scheduler`] trait the robot lifecycle talks to,
//!   and [`CommandScheduler`], the in-process implementation.

pub mod command;
pub mod scheduler;

pub use command::{Command, InstantCommand, SequentialCommand, TimedCommand};
pub use scheduler::{CommandHandle, CommandScheduler, Scheduler};
