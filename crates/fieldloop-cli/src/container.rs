//! Demo robot: a two-motor drivetrain and a drive-forward autonomous.

use fieldloop_command::{Command, InstantCommand, SequentialCommand, TimedCommand};
use fieldloop_hal::{Actuator, SharedActuator, SimActuator};
use fieldloop_logging::ActuatorTelemetry;
use fieldloop_runtime::RobotContainer;
use fieldloop_types::FieldError;

use crate::config::AutonomousRoutine;

/// Output applied to both sides while driving forward.
const DRIVE_OUTPUT: f64 = 0.5;

/// Left and right drive motors.
#[derive(Clone)]
pub struct Drivetrain {
    left: SharedActuator,
    right: SharedActuator,
}

impl Drivetrain {
    pub fn simulated() -> Self {
        Self {
            left: SimActuator::erase(&SimActuator::shared("left_drive")),
            right: SimActuator::erase(&SimActuator::shared("right_drive")),
        }
    }

    /// Telemetry adapter sampling both motors.
    pub fn telemetry(&self) -> ActuatorTelemetry {
        ActuatorTelemetry::new()
            .with_actuator(self.left.clone())
            .with_actuator(self.right.clone())
    }

    pub fn set(&self, left: f64, right: f64) -> Result<(), FieldError> {
        apply(&self.left, left)?;
        apply(&self.right, right)
    }

    pub fn stop(&self) -> Result<(), FieldError> {
        self.set(0.0, 0.0)
    }
}

fn apply(actuator: &SharedActuator, output: f64) -> Result<(), FieldError> {
    let mut motor = actuator.lock().map_err(|_| FieldError::HardwareFault {
        component: "drivetrain".to_string(),
        details: "actuator lock poisoned".to_string(),
    })?;
    motor.set_output(output)
}

pub struct DemoContainer {
    drivetrain: Drivetrain,
    routine: AutonomousRoutine,
    drive_periods: u32,
}

impl DemoContainer {
    /// `drive_periods` is how long the drive-forward routine drives before
    /// stopping.
    pub fn new(drivetrain: Drivetrain, routine: AutonomousRoutine, drive_periods: u32) -> Self {
        Self {
            drivetrain,
            routine,
            drive_periods,
        }
    }

    fn drive_forward(&self) -> Box<dyn Command> {
        let drive = self.drivetrain.clone();
        let stop_on_end = self.drivetrain.clone();
        let stop = self.drivetrain.clone();
        Box::new(SequentialCommand::new(
            "drive_forward",
            vec![
                Box::new(
                    TimedCommand::new("drive", self.drive_periods, move |_| {
                        drive.set(DRIVE_OUTPUT, DRIVE_OUTPUT)
                    })
                    .with_end(move |interrupted| {
                        if interrupted {
                            stop_on_end.stop()
                        } else {
                            Ok(())
                        }
                    }),
                ),
                Box::new(InstantCommand::new("stop", move || stop.stop())),
            ],
        ))
    }
}

impl RobotContainer for DemoContainer {
    fn autonomous_command(&mut self) -> Option<Box<dyn Command>> {
        match self.routine {
            AutonomousRoutine::DriveForward => Some(self.drive_forward()),
            AutonomousRoutine::None => None,
        }
    }
}
