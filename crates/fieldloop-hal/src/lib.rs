//! `fieldloop-hal` – Hardware boundary
//!
//! Everything the control loop knows about physical hardware lives here.
//!
//! # Modules
//!
//! - [`probe`] – [`HardwareProbe`][probe::HardwareProbe]: answers "is this
//!   process attached to real actuation hardware?".
//! - [`mode`] – [`ModeResolver`][mode::ModeResolver]: turns the probe result
//!   and the build-time preference into the process-wide
//!   [`Mode`][fieldloop_types::Mode].
//! - [`actuator`] – [`Actuator`][actuator::Actuator]: the trait motor
//!   controllers implement so their usage can be sampled into the log.
//! - [`sim`] – [`SimActuator`][sim::SimActuator]: a recording stand-in used
//!   when no hardware is attached.

pub mod actuator;
pub mod mode;
pub mod probe;
pub mod sim;

pub use actuator::{Actuator, SharedActuator};
pub use mode::{ModeResolver, SIM_MODE, robot_mode};
pub use probe::{FixedProbe, HardwareProbe, MarkerFileProbe};
pub use sim::SimActuator;
