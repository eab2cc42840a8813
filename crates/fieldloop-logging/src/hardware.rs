//! Hardware-usage telemetry adapters.
//!
//! An adapter is registered once before the logger starts and sampled at the
//! end of every cycle, after user code has applied its outputs.

use fieldloop_hal::SharedActuator;
use fieldloop_types::{FieldError, LogTable};

/// Collects low-level actuator/controller telemetry into the cycle's table.
pub trait HardwareTelemetry: Send {
    fn sample(&mut self, table: &mut LogTable) -> Result<(), FieldError>;
}

/// Samples every registered [`Actuator`][fieldloop_hal::Actuator] under
/// `Hardware/<id>/Output` and `Hardware/<id>/Position`.
#[derive(Default)]
pub struct ActuatorTelemetry {
    actuators: Vec<SharedActuator>,
}

impl ActuatorTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_actuator(mut self, actuator: SharedActuator) -> Self {
        self.actuators.push(actuator);
        self
    }

    pub fn len(&self) -> usize {
        self.actuators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actuators.is_empty()
    }
}

impl HardwareTelemetry for ActuatorTelemetry {
    fn sample(&mut self, table: &mut LogTable) -> Result<(), FieldError> {
        for actuator in &self.actuators {
            let act = actuator.lock().map_err(|_| FieldError::HardwareFault {
                component: "actuator".to_string(),
                details: "actuator lock poisoned".to_string(),
            })?;
            let id = act.id();
            table.put(format!("Hardware/{id}/Output"), act.output());
            table.put(format!("Hardware/{id}/Position"), act.position());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldloop_hal::{Actuator, SimActuator};
    use fieldloop_types::LogValue;

    #[test]
    fn samples_output_and_position_per_actuator() {
        let left = SimActuator::shared("left_drive");
        let right = SimActuator::shared("right_drive");
        left.lock().unwrap().set_output(0.5).unwrap();

        let mut telemetry = ActuatorTelemetry::new()
            .with_actuator(SimActuator::erase(&left))
            .with_actuator(SimActuator::erase(&right));
        assert_eq!(telemetry.len(), 2);

        let mut table = LogTable::new(0);
        telemetry.sample(&mut table).unwrap();
        assert_eq!(
            table.get("Hardware/left_drive/Output"),
            Some(&LogValue::Double(0.5))
        );
        assert_eq!(
            table.get("Hardware/right_drive/Position"),
            Some(&LogValue::Double(0.0))
        );
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn empty_adapter_adds_nothing() {
        let mut telemetry = ActuatorTelemetry::new();
        assert!(telemetry.is_empty());
        let mut table = LogTable::new(0);
        telemetry.sample(&mut table).unwrap();
        assert!(table.is_empty());
    }
}
