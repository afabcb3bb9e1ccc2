// Operator control policies: actuator arbitration and the lift state machine

pub mod arbitration;
pub mod lift;

pub use arbitration::compute_actuator_powers;
pub use lift::{DegradedControlWarning, LiftController, LiftMode};
