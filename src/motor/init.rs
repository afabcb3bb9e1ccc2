// Hardware initialization for a run phase
//
// Brings every actuator into a known state before the first tick. The order
// matters: encoders are reset before the run mode is switched (a motor left
// in reset mode will not move), and polarity is fixed before anything is
// commanded.

use tracing::{debug, info, warn};

use super::registry::{ActuatorId, ActuatorRegistry, HardwareError, RunMode, ZeroPowerBehavior};
use crate::config::DriveCalibration;

/// Which run phase is starting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    TeleopStart,
    AutonomousStart,
}

/// Motors whose encoders are reset and switched to open-loop at startup
pub const ENCODED_MOTORS: [ActuatorId; 7] = [
    ActuatorId::LeftFront,
    ActuatorId::RightFront,
    ActuatorId::LeftBack,
    ActuatorId::RightBack,
    ActuatorId::LeftIntake,
    ActuatorId::RightIntake,
    ActuatorId::LiftArm,
];

/// Initialize the hardware for `phase`
///
/// Every actuator is checked before anything is written, so a missing device
/// fails the phase without leaving the robot half configured.
pub fn initialize(
    phase: RunPhase,
    registry: &mut dyn ActuatorRegistry,
    calibration: &DriveCalibration,
) -> Result<(), HardwareError> {
    info!("Initializing hardware for {:?}", phase);

    // First, check that all actuators are wired up
    for id in ActuatorId::ALL {
        if registry.contains(id) {
            debug!("{} present", id);
        } else {
            warn!("{} missing from hardware map", id);
            return Err(HardwareError::MissingActuator { id });
        }
    }

    // Reset encoders (motor is stopped while in this mode)
    for id in ENCODED_MOTORS {
        registry.set_run_mode(id, RunMode::StopAndResetEncoder)?;
    }

    // Leave reset mode before the phase begins
    for id in ENCODED_MOTORS {
        registry.set_run_mode(id, RunMode::RunWithoutEncoder)?;
    }

    let directions = match phase {
        RunPhase::TeleopStart => &calibration.teleop_directions,
        RunPhase::AutonomousStart => &calibration.autonomous_directions,
    };
    for (&id, &direction) in directions {
        registry.set_direction(id, direction)?;
    }

    // Hold the arm when no power is applied
    registry.set_zero_power_behavior(ActuatorId::LiftArm, ZeroPowerBehavior::Brake)?;

    info!(
        "Hardware initialized: {} motors reset, {} polarities applied",
        ENCODED_MOTORS.len(),
        directions.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::registry::Direction;
    use crate::motor::sim::SimulatedRegistry;

    #[test]
    fn test_teleop_sequence() {
        let mut reg = SimulatedRegistry::new();
        reg.set_position(ActuatorId::LeftFront, 321);
        let cal = DriveCalibration::default();
        initialize(RunPhase::TeleopStart, &mut reg, &cal).unwrap();

        for id in ENCODED_MOTORS {
            assert_eq!(
                reg.mode_history(id),
                &[RunMode::StopAndResetEncoder, RunMode::RunWithoutEncoder],
                "{} should be reset then switched to open loop",
                id
            );
        }
        assert_eq!(reg.current_position(ActuatorId::LeftFront), Ok(0));
        assert_eq!(
            reg.zero_power_behavior(ActuatorId::LiftArm),
            Some(ZeroPowerBehavior::Brake)
        );
        for (id, dir) in &cal.teleop_directions {
            assert_eq!(reg.direction(*id), Some(*dir), "{} polarity", id);
        }
        assert_eq!(reg.direction(ActuatorId::RightFront), Some(Direction::Reverse));
        assert_eq!(reg.direction(ActuatorId::LeftFront), Some(Direction::Forward));
    }

    #[test]
    fn test_autonomous_configures_subset() {
        let mut reg = SimulatedRegistry::new();
        let cal = DriveCalibration::default();
        initialize(RunPhase::AutonomousStart, &mut reg, &cal).unwrap();

        assert_eq!(
            reg.direction(ActuatorId::LeftFoundation),
            Some(Direction::Reverse)
        );
        // wheels keep their wiring default in this variant
        assert_eq!(reg.direction(ActuatorId::RightFront), Some(Direction::Forward));
        assert_eq!(
            reg.mode_history(ActuatorId::LeftBack).last(),
            Some(&RunMode::RunWithoutEncoder)
        );
        assert_eq!(
            reg.zero_power_behavior(ActuatorId::LiftArm),
            Some(ZeroPowerBehavior::Brake)
        );
    }

    #[test]
    fn test_missing_actuator_is_fatal_and_writes_nothing() {
        let mut reg = SimulatedRegistry::new();
        reg.remove(ActuatorId::RightFoundation);
        let err = initialize(
            RunPhase::TeleopStart,
            &mut reg,
            &DriveCalibration::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            HardwareError::MissingActuator {
                id: ActuatorId::RightFoundation
            }
        );
        assert!(reg.mode_history(ActuatorId::LeftFront).is_empty());
        assert_eq!(reg.direction(ActuatorId::LeftIntake), Some(Direction::Forward));
    }
}
