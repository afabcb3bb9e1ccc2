// Motor layer for the mecanum base
//
// Provides:
// - Actuator registry interface (the hardware access layer)
// - In-memory registry for running without a robot
// - Mecanum inverse kinematics (drive vector -> wheel powers)
// - Run-phase hardware initialization

pub mod init;
pub mod kinematics;
pub mod registry;
pub mod sim;

pub use init::{RunPhase, initialize};
pub use kinematics::{WheelPowers, compute_wheel_powers};
pub use registry::{ActuatorId, ActuatorRegistry, HardwareError};
pub use sim::SimulatedRegistry;
