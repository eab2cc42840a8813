//! [`RobotLifecycle`] – boot protocol, periodic dispatch, and phase hooks.
//!
//! # Boot
//!
//! [`RobotLifecycle::boot`] runs once before the loop starts:
//!
//! 1. apply the [`sink_plan`] for the resolved [`Mode`];
//! 2. register the hardware-usage telemetry adapter (every mode);
//! 3. start the logger (after every sink and source is attached);
//! 4. build the robot container, the boundary into application code.
//!
//! # Phase hooks
//!
//! | Entering | Action |
//! |---|---|
//! | `Disabled` | nothing |
//! | `Autonomous` | ask the container for an autonomous command; schedule it if present |
//! | `Teleop` | cancel the autonomous command, if one was scheduled |
//! | `Test` | cancel every scheduled command |
//!
//! Phase-periodic and exit hooks do nothing at this layer.  Errors from the
//! scheduler, the logger, or the container are returned untouched.

use fieldloop_command::{Command, CommandHandle, Scheduler};
use fieldloop_logging::{HardwareTelemetry, Logger};
use fieldloop_types::{FieldError, Mode, Phase};
use tracing::{debug, info};

use crate::boot::{BootOutcome, SinkFactory, apply_plan, sink_plan};

/// Application-side object that owns subsystems and builds commands.
pub trait RobotContainer {
    /// The routine to run when autonomous begins, if any.
    fn autonomous_command(&mut self) -> Option<Box<dyn Command>>;
}

/// The hooks a [`LoopDriver`][crate::driver::LoopDriver] calls.
pub trait LifecycleHooks {
    /// Called once per period in every phase.
    fn on_periodic(&mut self) -> Result<(), FieldError>;

    /// Called once when `phase` becomes active, before its first periodic
    /// call.
    fn on_phase_enter(&mut self, phase: Phase) -> Result<(), FieldError>;

    fn on_phase_periodic(&mut self, _phase: Phase) -> Result<(), FieldError> {
        Ok(())
    }

    fn on_phase_exit(&mut self, _phase: Phase) -> Result<(), FieldError> {
        Ok(())
    }
}

pub struct RobotLifecycle<S, C> {
    mode: Mode,
    scheduler: S,
    container: C,
    autonomous: Option<CommandHandle>,
    boot: BootOutcome,
}

impl<S: Scheduler, C: RobotContainer> RobotLifecycle<S, C> {
    /// Wire logging for `mode`, start the logger, and build the container.
    ///
    /// # Errors
    ///
    /// Any failure here is fatal: a missing replay log, a sink that cannot
    /// start, or a container that cannot be built.
    pub fn boot(
        mode: Mode,
        logger: &mut Logger,
        factory: &mut dyn SinkFactory,
        hardware: Box<dyn HardwareTelemetry>,
        scheduler: S,
        build_container: impl FnOnce() -> Result<C, FieldError>,
    ) -> Result<Self, FieldError> {
        let boot = apply_plan(&sink_plan(mode), logger, factory)?;
        logger.register_hardware_telemetry(hardware)?;
        logger.record_metadata("Mode", mode.to_string())?;
        if let Some(path) = &boot.replay_log {
            logger.record_metadata("ReplaySource", path.display().to_string())?;
        }
        logger.start()?;

        let container = build_container()?;
        info!(%mode, use_timing = boot.use_timing, "robot booted");

        Ok(Self {
            mode,
            scheduler,
            container,
            autonomous: None,
            boot,
        })
    }

    /// Assemble a lifecycle without touching logging.
    pub fn from_parts(mode: Mode, scheduler: S, container: C, boot: BootOutcome) -> Self {
        Self {
            mode,
            scheduler,
            container,
            autonomous: None,
            boot,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// `false` in replay: the driver should run back-to-back.
    pub fn uses_timing(&self) -> bool {
        self.boot.use_timing
    }

    pub fn boot_outcome(&self) -> &BootOutcome {
        &self.boot
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn container(&self) -> &C {
        &self.container
    }

    /// Handle of the autonomous command scheduled on the last autonomous
    /// entry, until teleop cancels it.
    pub fn autonomous_handle(&self) -> Option<CommandHandle> {
        self.autonomous
    }
}

impl<S: Scheduler, C: RobotContainer> LifecycleHooks for RobotLifecycle<S, C> {
    fn on_periodic(&mut self) -> Result<(), FieldError> {
        self.scheduler.run()
    }

    fn on_phase_enter(&mut self, phase: Phase) -> Result<(), FieldError> {
        debug!(%phase, "phase entered");
        match phase {
            Phase::Disabled => Ok(()),
            Phase::Autonomous => {
                if let Some(command) = self.container.autonomous_command() {
                    let name = command.name().to_string();
                    let handle = self.scheduler.schedule(command)?;
                    info!(command = %name, %handle, "autonomous command scheduled");
                    self.autonomous = Some(handle);
                }
                Ok(())
            }
            Phase::Teleop => {
                if let Some(handle) = self.autonomous.take() {
                    info!(%handle, "cancelling autonomous command for teleop");
                    self.scheduler.cancel(handle)?;
                }
                Ok(())
            }
            Phase::Test => self.scheduler.cancel_all(),
        }
    }
}
