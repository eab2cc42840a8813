//! Generic `Actuator` trait for motor controllers and any output-driven
//! hardware.
//!
//! Drivers implement this trait so commands can drive them and the
//! hardware-usage telemetry adapter can sample them every cycle without
//! knowing which vendor sits behind the id.

use std::sync::{Arc, Mutex};

use fieldloop_types::FieldError;

/// An output-driven actuator (motor controller, servo, …).
pub trait Actuator: Send {
    /// Stable identifier, e.g. `"left_drive"`.  Used as the telemetry key.
    fn id(&self) -> &str;

    /// Apply a duty-cycle output in `[-1.0, 1.0]`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::HardwareFault`] if the controller rejects the
    /// command (e.g. it is in a fault state).
    fn set_output(&mut self, output: f64) -> Result<(), FieldError>;

    /// The most recently applied output.
    fn output(&self) -> f64;

    /// Accumulated position in rotations since boot.
    fn position(&self) -> f64;
}

/// Actuators are shared between the commands that drive them and the
/// telemetry adapter that samples them.
pub type SharedActuator = Arc<Mutex<dyn Actuator>>;

#[cfg(test)]
mod tests {
    use super::*;

    struct MockActuator {
        id: String,
        output: f64,
    }

    impl Actuator for MockActuator {
        fn id(&self) -> &str {
            &self.id
        }

        fn set_output(&mut self, output: f64) -> Result<(), FieldError> {
            if output.abs() > 1.0 {
                return Err(FieldError::HardwareFault {
                    component: self.id.clone(),
                    details: format!("output {output} out of range"),
                });
            }
            self.output = output;
            Ok(())
        }

        fn output(&self) -> f64 {
            self.output
        }

        fn position(&self) -> f64 {
            0.0
        }
    }

    #[test]
    fn shared_actuator_is_usable_through_the_mutex() {
        let shared: SharedActuator = Arc::new(Mutex::new(MockActuator {
            id: "arm".to_string(),
            output: 0.0,
        }));
        shared.lock().unwrap().set_output(0.25).unwrap();
        assert!((shared.lock().unwrap().output() - 0.25).abs() < f64::EPSILON);
        assert!(shared.lock().unwrap().set_output(1.5).is_err());
    }
}
