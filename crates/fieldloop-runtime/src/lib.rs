//! `fieldloop-runtime` – Robot lifecycle and control loop
//!
//! Wires the pieces from the lower crates into a running robot: logging
//! sinks chosen by the resolved [`Mode`][fieldloop_types::Mode], the command
//! scheduler, and the application's robot container.
//!
//! # Modules
//!
//! - [`boot`] – [`sink_plan`][boot::sink_plan], the mode → sink table, and
//!   [`apply_plan`][boot::apply_plan], which attaches the sinks a
//!   [`SinkFactory`][boot::SinkFactory] builds.
//! - [`lifecycle`] – [`RobotLifecycle`][lifecycle::RobotLifecycle]: the boot
//!   protocol, periodic scheduler dispatch, and phase-entry behaviour.
//! - [`driver`] – [`LoopDriver`][driver::LoopDriver]: the fixed-period loop
//!   that owns the logger cycle and calls the lifecycle hooks, plus the
//!   scripted [`MatchTimeline`][driver::MatchTimeline] phase source.
//! - [`watchdog`] – [`LoopWatchdog`][watchdog::LoopWatchdog]: per-cycle
//!   overrun detection with an epoch breakdown.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   initialises the global `tracing` subscriber with an optional OTLP span
//!   exporter.

pub mod boot;
pub mod driver;
pub mod lifecycle;
pub mod telemetry;
pub mod watchdog;

pub use boot::{
    BootOutcome, DefaultSinkFactory, REPLAY_SUFFIX, SinkDirective, SinkFactory, apply_plan,
    sink_plan,
};
pub use driver::{
    DEFAULT_PERIOD, LoopDriver, MatchTimeline, PHASE_KEY, PhaseSource, RunSummary, StopReason,
};
pub use lifecycle::{LifecycleHooks, RobotContainer, RobotLifecycle};
pub use telemetry::{TracerProviderGuard, init_tracing};
pub use watchdog::LoopWatchdog;
