//! Simulated drivers for running the full loop without hardware.
//!
//! [`SimActuator`] records every commanded output and advances a crude
//! position counter (one rotation per full-output command).  There is no
//! physics model; the point is that commands, telemetry, and logging all see
//! plausible, deterministic values.
//!
//! # Example
//!
//! ```rust
//! use fieldloop_hal::actuator::Actuator;
//! use fieldloop_hal::sim::SimActuator;
//!
//! let left = SimActuator::shared("left_drive");
//! left.lock().unwrap().set_output(0.5).expect("sim output must succeed");
//! assert_eq!(left.lock().unwrap().output(), 0.5);
//! ```

use std::sync::{Arc, Mutex};

use fieldloop_types::FieldError;

use crate::actuator::{Actuator, SharedActuator};

// ────────────────────────────────────────────────────────────────────────────
// Stub actuator
// ────────────────────────────────────────────────────────────────────────────

/// A simulated actuator.  Outputs are clamped to `[-1.0, 1.0]`; always
/// succeeds.
pub struct SimActuator {
    id: String,
    output: f64,
    position: f64,
}

impl SimActuator {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            output: 0.0,
            position: 0.0,
        }
    }

    /// Create a simulated actuator already wrapped for sharing.
    pub fn shared(id: impl Into<String>) -> Arc<Mutex<SimActuator>> {
        Arc::new(Mutex::new(Self::new(id)))
    }

    /// Erase the concrete type, e.g. for registration with telemetry.
    pub fn erase(actuator: &Arc<Mutex<SimActuator>>) -> SharedActuator {
        actuator.clone()
    }
}

impl Actuator for SimActuator {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_output(&mut self, output: f64) -> Result<(), FieldError> {
        self.output = output.clamp(-1.0, 1.0);
        self.position += self.output;
        Ok(())
    }

    fn output(&self) -> f64 {
        self.output
    }

    fn position(&self) -> f64 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_actuator_records_output_and_position() {
        let mut act = SimActuator::new("left_drive");
        assert_eq!(act.id(), "left_drive");
        act.set_output(0.5).unwrap();
        act.set_output(0.5).unwrap();
        assert!((act.output() - 0.5).abs() < f64::EPSILON);
        assert!((act.position() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sim_actuator_clamps_output() {
        let mut act = SimActuator::new("arm");
        act.set_output(3.0).unwrap();
        assert!((act.output() - 1.0).abs() < f64::EPSILON);
        act.set_output(-7.0).unwrap();
        assert!((act.output() + 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn erased_handle_shares_state() {
        let concrete = SimActuator::shared("right_drive");
        let erased = SimActuator::erase(&concrete);
        erased.lock().unwrap().set_output(0.25).unwrap();
        assert!((concrete.lock().unwrap().output() - 0.25).abs() < f64::EPSILON);
    }
}
